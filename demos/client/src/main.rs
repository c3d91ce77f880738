//! Interactive terminal client for the TinyRPG session authority.
//!
//! The input loop never touches the socket: it parses commands and pushes
//! them onto a queue. Exactly one network worker drains that queue and
//! performs the blocking round trip, so requests go out in the order they
//! were typed, one in flight at a time, with a single writer on the
//! socket.

use std::error::Error;

use tinyrpg_protocol::{
    ActionRequest, Codec, CombatSnapshot, JsonCodec, LobbySnapshot, Request,
    Response, SlotId, CLIENT_HELLO, DEFAULT_PORT, SERVER_HELLO,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Errors cross the network worker's task boundary, so they must be Send.
type ClientError = Box<dyn Error + Send + Sync>;

/// A user intent, queued for the network worker.
enum Command {
    Profession(String),
    Ready(bool),
    Refresh,
    Start,
    Act { action: String, target: SlotId },
    End,
    Exit,
}

struct ServerConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    codec: JsonCodec,
}

impl ServerConnection {
    async fn open(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read, write) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read),
            writer: write,
            codec: JsonCodec,
        })
    }

    async fn send_line(&mut self, line: &[u8]) -> Result<(), ClientError> {
        self.writer.write_all(line).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv_line(&mut self) -> Result<String, ClientError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            return Err("server closed the connection".into());
        }
        Ok(line.trim_end().to_string())
    }

    async fn handshake(&mut self) -> Result<(), ClientError> {
        self.send_line(CLIENT_HELLO.as_bytes()).await?;
        let greeting = self.recv_line().await?;
        if greeting != SERVER_HELLO {
            return Err("server failed the handshake".into());
        }
        Ok(())
    }

    async fn round_trip(
        &mut self,
        request: &Request,
    ) -> Result<Response, ClientError> {
        let bytes = self.codec.encode(request)?;
        self.send_line(&bytes).await?;
        let line = self.recv_line().await?;
        Ok(self.codec.decode(line.as_bytes())?)
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| {
        eprintln!("usage: tinyrpg-client <name> [addr]");
        std::process::exit(2);
    });
    let addr = args
        .next()
        .unwrap_or_else(|| format!("127.0.0.1:{DEFAULT_PORT}"));

    let mut conn = ServerConnection::open(&addr).await?;
    conn.handshake().await?;

    match conn.round_trip(&Request::JoinLobby(name.clone())).await? {
        Response::JoinAccept(snapshot) => {
            println!("joined {addr} as {name}");
            render_lobby(&snapshot);
        }
        Response::Error(reason) => {
            return Err(format!("join rejected: {reason}").into());
        }
        other => return Err(format!("unexpected reply: {other:?}").into()),
    }

    let (queue, mut pending) = mpsc::unbounded_channel::<Command>();

    // The single network worker: drains the queue, one round trip at a time.
    let worker = tokio::spawn(async move {
        while let Some(command) = pending.recv().await {
            let request = match command {
                Command::Profession(name) => Request::UpdateProfession(name),
                Command::Ready(ready) => Request::UpdateReady(ready),
                Command::Refresh => Request::GetUpdate(None),
                Command::Start => Request::TryStart(String::new()),
                Command::Act { action, target } => {
                    Request::DoAction(ActionRequest { action, target })
                }
                Command::End => Request::EndTurn(String::new()),
                Command::Exit => {
                    let bytes = conn
                        .codec
                        .encode(&Request::Exit(String::new()))
                        .expect("encode EXIT");
                    let _ = conn.send_line(&bytes).await;
                    println!("left the session");
                    return;
                }
            };
            match conn.round_trip(&request).await {
                Ok(response) => render(&response),
                Err(e) => {
                    eprintln!("request failed: {e}");
                    return;
                }
            }
        }
    });

    print_help();
    let mut ready = false;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        let (verb, rest) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        match verb {
            "" => {}
            "help" => print_help(),
            "prof" if !rest.is_empty() => {
                queue.send(Command::Profession(rest.to_string()))?;
            }
            "ready" => {
                ready = !ready;
                queue.send(Command::Ready(ready))?;
            }
            "refresh" => queue.send(Command::Refresh)?,
            "start" => queue.send(Command::Start)?,
            "act" if !rest.is_empty() => match parse_act(rest) {
                Some((action, target)) => {
                    queue.send(Command::Act { action, target })?;
                }
                None => eprintln!("usage: act <action> <p1..p6>"),
            },
            "end" => queue.send(Command::End)?,
            "exit" => {
                queue.send(Command::Exit)?;
                break;
            }
            _ => eprintln!("unknown command {line:?} (try \"help\")"),
        }
    }

    drop(queue);
    worker.await?;
    Ok(())
}

/// Splits `act` arguments: the last word is the target slot, everything
/// before it is the action name (action names may contain spaces).
fn parse_act(rest: &str) -> Option<(String, SlotId)> {
    let (action, target) = rest.rsplit_once(' ')?;
    let target: SlotId = target.parse().ok()?;
    let action = action.trim();
    (!action.is_empty()).then(|| (action.to_string(), target))
}

fn print_help() {
    println!(
        "commands: prof <name> | ready | refresh | start | \
         act <action> <p1..p6> | end | exit"
    );
}

fn render(response: &Response) {
    match response {
        Response::JoinAccept(snapshot) | Response::LobbyData(snapshot) => {
            render_lobby(snapshot);
        }
        Response::GameData(snapshot) => render_combat(snapshot),
        Response::GameStart(start) => {
            println!("the match has started!");
            render_combat(&start.game);
        }
        Response::Error(reason) => println!("server says: {reason}"),
    }
}

fn render_lobby(snapshot: &LobbySnapshot) {
    println!("--- lobby ---");
    for (slot, entry) in &snapshot.lobby {
        if entry.name.is_empty() {
            println!("{slot}  <empty>");
        } else {
            let profession = if entry.profession.is_empty() {
                "None"
            } else {
                &entry.profession
            };
            let ready = if entry.ready { "ready" } else { "not ready" };
            println!("{slot}  {:<24} {:<8} {ready}", entry.name, profession);
        }
    }
    if let Some(number) = snapshot.player_number {
        println!("(you are p{number})");
    }
}

fn render_combat(snapshot: &CombatSnapshot) {
    println!(
        "--- turn {} | active {} ---",
        snapshot.turn_number, snapshot.active_player
    );
    for (slot, entry) in &snapshot.players {
        if entry.name.is_empty() {
            continue;
        }
        println!(
            "{slot}  {:<24} {:<8} hp {}/{}  ap {}/{}  mana {}/{}",
            entry.name,
            entry.profession,
            entry.hp[0],
            entry.hp[1],
            entry.ap[0],
            entry.ap[1],
            entry.mana[0],
            entry.mana[1],
        );
    }
    if let Some(number) = snapshot.player_number {
        println!("(you are p{number})");
    }
}

use cmdbus_macros::command;

#[command(name = "ping", name = "pong")]
struct Ping;

fn main() {}

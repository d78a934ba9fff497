use cmdbus_macros::command;

#[command(name = "  ")]
struct Ping;

fn main() {}

use cmdbus_macros::command;

#[command(id = 1)]
struct Ping;

fn main() {}

use cmdbus_macros::command;

#[command(output = u8, output = u16)]
struct Ping;

fn main() {}

use cmdbus::command::Command;
use cmdbus_macros::command;

#[command]
struct Ping;

#[command(name = "account.open", output = u64)]
struct OpenAccount {
    owner: String,
}

#[command(output = Result<(), String>,)]
struct Validate(u8);

fn main() {
    // 名称默认取类型名，输出默认 ()
    assert_eq!(<Ping as Command>::NAME, "Ping");
    let _: <Ping as Command>::Output = ();

    assert_eq!(<OpenAccount as Command>::NAME, "account.open");
    let _: <OpenAccount as Command>::Output = 7_u64;
    let _ = OpenAccount { owner: "alice".into() }.owner;

    let _: <Validate as Command>::Output = Ok(());
    let _ = Validate(1).0;
}

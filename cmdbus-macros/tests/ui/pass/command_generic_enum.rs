use cmdbus::command::Command;
use cmdbus_macros::command;
use std::marker::PhantomData;

#[allow(dead_code)]
#[command(name = "switch")]
enum Switch {
    On,
    Off,
}

#[command(output = Vec<T>)]
struct Collect<T: Send + Sync + 'static> {
    _marker: PhantomData<T>,
}

fn main() {
    assert_eq!(<Switch as Command>::NAME, "switch");
    assert_eq!(<Collect<u8> as Command>::NAME, "Collect");
    let _: <Collect<u8> as Command>::Output = vec![1_u8];
}

use proc_macro::TokenStream;

mod command;

/// 命令宏
/// - 为结构体或枚举实现 `::cmdbus::command::Command`
/// - 参数：`#[command(name = "...", output = Type)]`
///   - `name` 默认取类型名，用于日志与错误信息
///   - `output` 默认 `()`
#[proc_macro_attribute]
pub fn command(attr: TokenStream, item: TokenStream) -> TokenStream {
    command::expand(attr, item)
}

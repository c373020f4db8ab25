//! 辅助工具（浏览器控制台日志）。

pub fn console_warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

/// ユーザーへの通知（表示方法・表示時間は実装側に任せる）
pub trait Notifier {
    fn show_success(&self, message: &str);
    fn show_error(&self, message: &str);
}

/// 端末に出力する通知
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_success(&self, message: &str) {
        println!("✔ {}", message);
    }

    fn show_error(&self, message: &str) {
        eprintln!("✖ {}", message);
    }
}

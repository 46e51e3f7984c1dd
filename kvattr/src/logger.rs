use chrono::Local;
use std::fmt;

fn line(level: &str, args: fmt::Arguments) -> String {
    let now = Local::now();
    format!("[{}] {} kvattr: {}", now.format("%Y-%m-%d %H:%M:%S"), level, args)
}

/// Every level goes to stdout.
fn emit(level: &str, args: fmt::Arguments) {
    println!("{}", line(level, args));
}

pub fn info(args: fmt::Arguments) {
    emit("INFO", args);
}

pub fn warn(args: fmt::Arguments) {
    emit("WARN", args);
}

pub fn error(args: fmt::Arguments) {
    emit("ERROR", args);
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logger::info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logger::warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logger::error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_timestamp_level_and_message() {
        let line = line("ERROR", format_args!("pool {} failed", "default"));
        assert!(line.starts_with('['));
        assert!(line.ends_with("] ERROR kvattr: pool default failed"), "got {}", line);
        assert_eq!(line.find(']'), Some(20));
    }

    #[test]
    fn every_level_emits() {
        crate::info!("info {}", 1);
        crate::warn!("warn {}", 2);
        crate::error!("error {}", 3);
    }
}

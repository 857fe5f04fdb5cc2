use std::sync::{Mutex, PoisonError};

use log::{error, info, warn};

/// 面向用户的短暂提示
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);
}

/// 把提示写进日志，命令行下默认使用
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        info!("{}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// 记录收到的所有提示
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn levels(&self) -> Vec<NoticeLevel> {
        self.notices().into_iter().map(|notice| notice.level).collect()
    }

    fn push(&self, level: NoticeLevel, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Notice {
                level,
                message: message.to_string(),
            });
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.push(NoticeLevel::Success, message);
    }

    fn warning(&self, message: &str) {
        self.push(NoticeLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push(NoticeLevel::Error, message);
    }
}

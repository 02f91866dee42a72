use devkit_logger::Logger;

/// The two levels the initializer reports on.
pub trait EnvLog {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default log: info on stdout, error on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl EnvLog for ConsoleLog {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }
}

impl EnvLog for dyn Logger {
    fn info(&self, message: &str) {
        Logger::info(self, message, None);
    }

    fn error(&self, message: &str) {
        Logger::error(self, message, None);
    }
}

impl<L: EnvLog + ?Sized> EnvLog for Box<L> {
    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn error(&self, message: &str) {
        (**self).error(message);
    }
}

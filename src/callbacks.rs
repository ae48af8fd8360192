use std::io::{self, Write};

use tracing::{debug, info};

use crate::history::EpochLogs;

/// Hook invoked by `Model::fit` once per epoch.
pub trait EpochObserver {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs);

    fn on_train_end(&mut self) {}
}

/// Prints a dot per epoch and starts a new line every 100 epochs.
pub struct PrintDot<W: Write> {
    out: W,
}

impl PrintDot<io::Stdout> {
    pub fn stdout() -> Self {
        PrintDot { out: io::stdout() }
    }
}

impl<W: Write> PrintDot<W> {
    pub fn new(out: W) -> Self {
        PrintDot { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EpochObserver for PrintDot<W> {
    fn on_epoch_end(&mut self, epoch: usize, _logs: &EpochLogs) {
        // Progress output is best effort.
        if epoch % 100 == 0 {
            let _ = writeln!(self.out);
        }
        let _ = write!(self.out, ".");
        let _ = self.out.flush();
    }

    fn on_train_end(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

/// Emits a tracing event every `every` epochs.
pub struct LogProgress {
    pub every: usize,
}

impl Default for LogProgress {
    fn default() -> Self {
        LogProgress { every: 100 }
    }
}

impl EpochObserver for LogProgress {
    fn on_epoch_end(&mut self, epoch: usize, logs: &EpochLogs) {
        if self.every == 0 || epoch % self.every != 0 {
            return;
        }
        match logs.validation {
            Some(val) => info!(
                epoch,
                loss = logs.train.loss,
                mae = logs.train.mae,
                val_loss = val.loss,
                val_mae = val.mae,
                "epoch finished"
            ),
            None => info!(epoch, loss = logs.train.loss, mae = logs.train.mae, "epoch finished"),
        }
    }

    fn on_train_end(&mut self) {
        debug!("training finished");
    }
}

pub struct Silent;

impl EpochObserver for Silent {
    fn on_epoch_end(&mut self, _epoch: usize, _logs: &EpochLogs) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EpochMetrics;

    #[test]
    fn test_print_dot_layout() {
        let logs = EpochLogs { train: EpochMetrics::default(), validation: None };
        let mut dots = PrintDot::new(Vec::new());
        for epoch in 0..250 {
            dots.on_epoch_end(epoch, &logs);
        }
        dots.on_train_end();

        let text = String::from_utf8(dots.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![String::new(), ".".repeat(100), ".".repeat(100), ".".repeat(50)]);
    }
}

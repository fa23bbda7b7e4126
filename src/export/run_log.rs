//! Appendable delimited run log
//!
//! The log starts with a preamble describing the run (simulation parameters,
//! episode counts, learning hyper-parameters), followed by a column header
//! row and one comma-delimited row per emitted training summary.

use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use tracing::warn;

use crate::{
    Error, Result,
    app::config::RunConfig,
    pipeline::stats::SummaryRow,
    ports::Observer,
    types::RunPhase,
};

const SEPARATOR: &str = "----------";

/// Columns that are part of the format but not filled by the learning core.
pub const RESERVED_COLUMNS: [&str; 2] = ["loss", "learning rate"];

/// Log file name for a run started at `started`.
///
/// Dashes in the configured stem become underscores, followed by the local
/// start time, e.g. `ql_slime_03_14_2025__09_26_53.csv`.
pub fn log_file_name(config: &RunConfig, started: &DateTime<Local>) -> String {
    format!(
        "{}_{}.csv",
        config.learning.output_file.replace('-', "_"),
        started.format("%m_%d_%Y__%H_%M_%S")
    )
}

/// Column header row in report order.
pub fn column_names(config: &RunConfig) -> Vec<String> {
    let actions = config.report_action_names();
    let mut columns = vec![
        "Episode".to_string(),
        "Tick".to_string(),
        "Avg cluster size X tick".to_string(),
    ];
    columns.extend(actions.iter().map(|name| name.to_string()));
    for learner in config.learner_ids() {
        columns.extend(
            actions
                .iter()
                .map(|name| format!("(learner {learner})-{name}")),
        );
    }
    columns.push("Avg reward X episode".to_string());
    columns.extend(RESERVED_COLUMNS.iter().map(|name| name.to_string()));
    columns
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer)
}

fn write_preamble<W: Write>(writer: &mut W, config: &RunConfig) -> Result<()> {
    let learning = &config.learning;
    writeln!(writer, "{}", serde_json::to_string_pretty(&config.env)?)?;
    writeln!(writer, "{SEPARATOR}")?;
    writeln!(writer, "TRAIN_EPISODES = {}", learning.train_episodes)?;
    writeln!(writer, "TEST_EPISODES = {}", learning.test_episodes)?;
    writeln!(writer, "{SEPARATOR}")?;
    writeln!(writer, "alpha = {}", learning.alpha)?;
    writeln!(writer, "gamma = {}", learning.gamma)?;
    writeln!(writer, "epsilon = {}", learning.epsilon)?;
    writeln!(writer, "decay = {}", learning.decay)?;
    writeln!(writer, "{SEPARATOR}")?;
    Ok(())
}

/// Run log writer.
///
/// Each row is appended by reopening the file, so the log stays readable
/// while a run is in progress. A failed row is kept as pending and retried
/// once; a second failure is returned to the caller.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    pending: Option<Vec<String>>,
}

impl RunLog {
    /// Create `dir` if needed and start a timestamped log inside it.
    pub fn create_in(dir: &Path, config: &RunConfig) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|err| Error::io(format!("create log directory '{}'", dir.display()), err))?;
        let path = dir.join(log_file_name(config, &Local::now()));
        Self::create(&path, config)
    }

    /// Write the preamble and column header to `path`, replacing any file.
    pub fn create(path: &Path, config: &RunConfig) -> Result<Self> {
        let file = File::create(path)
            .map_err(|err| Error::io(format!("create run log '{}'", path.display()), err))?;
        let mut writer = BufWriter::new(file);
        write_preamble(&mut writer, config)?;

        let mut csv = csv_writer(writer);
        csv.write_record(column_names(config))?;
        csv.flush()?;

        Ok(Self {
            path: path.to_path_buf(),
            pending: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row that failed to write, if the last append did not succeed.
    pub fn pending_row(&self) -> Option<&[String]> {
        self.pending.as_deref()
    }

    fn try_append(&self, record: &[String]) -> csv::Result<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut csv = csv_writer(file);
        csv.write_record(record)?;
        csv.flush()?;
        Ok(())
    }

    /// Append one summary row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogWrite`] when the row cannot be written after one
    /// retry. The row then remains available through [`RunLog::pending_row`].
    pub fn append(&mut self, row: &SummaryRow) -> Result<()> {
        let record = row.to_record();
        if let Err(err) = self.try_append(&record) {
            warn!(path = %self.path.display(), episode = row.episode, error = %err, "summary row write failed, retrying");
            self.pending = Some(record);
            let retry = self.pending.as_deref().map(|pending| self.try_append(pending));
            if let Some(Err(source)) = retry {
                return Err(Error::LogWrite {
                    path: self.path.clone(),
                    attempts: 2,
                    source,
                });
            }
        }
        self.pending = None;
        Ok(())
    }
}

impl Observer for RunLog {
    fn on_summary(&mut self, phase: RunPhase, row: &SummaryRow) -> Result<()> {
        // Only training rows belong in the run log.
        if phase == RunPhase::Training {
            self.append(row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        app::config::tests::{LEARNING, PARAMS},
        types::AgentId,
    };

    fn config() -> RunConfig {
        RunConfig::from_json_strs(PARAMS, LEARNING).unwrap()
    }

    fn row(episode: usize) -> SummaryRow {
        SummaryRow {
            episode,
            tick: episode * 3,
            cluster_metric: 2.5,
            global_counts: [3, 2, 1],
            learner_counts: vec![(AgentId::new(4), [2, 1, 0]), (AgentId::new(5), [1, 1, 1])],
            avg_reward: 0.5,
        }
    }

    #[test]
    fn test_file_name_format() {
        let started = Local.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(
            log_file_name(&config(), &started),
            "ql_test_03_14_2025__09_26_53.csv"
        );
    }

    #[test]
    fn test_column_names() {
        let columns = column_names(&config());
        assert_eq!(
            &columns[..6],
            &[
                "Episode",
                "Tick",
                "Avg cluster size X tick",
                "move-toward-chemical",
                "random-walk",
                "drop-chemical"
            ]
        );
        assert_eq!(columns[6], "(learner 4)-move-toward-chemical");
        assert_eq!(columns[11], "(learner 5)-drop-chemical");
        assert_eq!(
            &columns[12..],
            &["Avg reward X episode", "loss", "learning rate"]
        );
    }

    #[test]
    fn test_preamble_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        let mut log = RunLog::create(&path, &config()).unwrap();
        log.on_summary(RunPhase::Training, &row(2)).unwrap();
        log.on_summary(RunPhase::Evaluation, &row(3)).unwrap();
        log.append(&row(4)).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"learner_population\": 2"));
        assert!(contents.contains("TRAIN_EPISODES = 4\nTEST_EPISODES = 2\n"));
        assert!(contents.contains("alpha = 0.5\ngamma = 0.9\nepsilon = 0.9\ndecay = 0.99\n"));

        let lines: Vec<&str> = contents.lines().collect();
        let header_index = lines
            .iter()
            .position(|line| line.starts_with("Episode,"))
            .unwrap();
        assert_eq!(lines[header_index + 1], "2,6,2.5,3,2,1,2,1,0,1,1,1,0.5");
        assert_eq!(lines[header_index + 2], "4,12,2.5,3,2,1,2,1,0,1,1,1,0.5");
        assert_eq!(lines.len(), header_index + 3);
    }

    #[test]
    fn test_create_in_makes_directory() {
        let dir = TempDir::new().unwrap();
        let runs = dir.path().join("runs");
        let log = RunLog::create_in(&runs, &config()).unwrap();
        assert!(log.path().starts_with(&runs));
        assert!(log.path().exists());
    }

    #[test]
    fn test_failed_write_is_retried_then_escalated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.csv");
        let mut log = RunLog::create(&path, &config()).unwrap();

        // Replace the log with a directory so every reopen fails.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = log.append(&row(2)).unwrap_err();
        assert!(matches!(err, Error::LogWrite { attempts: 2, .. }));
        assert_eq!(log.pending_row().map(<[String]>::len), Some(13));
    }
}

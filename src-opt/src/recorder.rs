use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::error::Result;
use crate::optimizer::{OptimizationResult, Progress, ProgressCallback};

/// Records optimization progress via the progress callback
#[derive(Debug, Clone)]
pub struct OptimizationRecorder {
    /// Problem name (used for the CSV filename)
    name: String,
    records: Arc<Mutex<Vec<ProgressRecord>>>,
    /// Best fitness seen so far, over all runs
    best_value: Arc<Mutex<Option<f64>>>,
}

/// One generation (DE) or sweep (pattern search)
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub run: usize,
    pub generation: usize,
    /// Best parameters of the reporting run
    pub x: Vec<f64>,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub step: Option<f64>,
    /// Whether this record improved on every earlier one
    pub is_improvement: bool,
}

impl OptimizationRecorder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(Mutex::new(Vec::new())),
            best_value: Arc::new(Mutex::new(None)),
        }
    }

    /// Callback storing one record per progress report
    pub fn create_callback(&self) -> ProgressCallback {
        let records = Arc::clone(&self.records);
        let best_value = Arc::clone(&self.best_value);

        Box::new(move |progress: &Progress| {
            let is_improvement = {
                let mut best = best_value.lock();
                let improved = best.is_none_or(|b| progress.best_fitness < b);
                if improved {
                    *best = Some(progress.best_fitness);
                }
                improved
            };
            records.lock().push(ProgressRecord {
                run: progress.run,
                generation: progress.generation,
                x: progress.best_params.to_vec(),
                best_fitness: progress.best_fitness,
                average_fitness: progress.average_fitness,
                step: progress.step,
                is_improvement,
            });
        })
    }

    /// Write all records to `<output_dir>/<name>.csv` and return the path
    pub fn save_to_csv(&self, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        create_dir_all(output_dir.as_ref())?;
        let path = output_dir.as_ref().join(format!("{}.csv", self.name));
        let records = self.records.lock();

        let mut writer = csv::Writer::from_path(&path)?;
        let dims = records.first().map_or(0, |r| r.x.len());
        let mut header = vec!["run".to_string(), "generation".to_string()];
        header.extend((0..dims).map(|i| format!("x{}", i)));
        header.extend(
            ["best_fitness", "average_fitness", "step", "is_improvement"]
                .iter()
                .map(|s| s.to_string()),
        );
        writer.write_record(&header)?;

        for r in records.iter() {
            let mut row = vec![r.run.to_string(), r.generation.to_string()];
            row.extend(r.x.iter().map(|v| format!("{:.16}", v)));
            row.push(format!("{:.16}", r.best_fitness));
            row.push(format!("{:.16}", r.average_fitness));
            row.push(r.step.map(|s| format!("{:.16}", s)).unwrap_or_default());
            row.push(r.is_improvement.to_string());
            writer.write_record(&row)?;
        }
        writer.flush()?;
        debug!("saved {} progress records to {}", records.len(), path.display());
        Ok(path)
    }

    pub fn get_records(&self) -> Vec<ProgressRecord> {
        self.records.lock().clone()
    }

    pub fn num_records(&self) -> usize {
        self.records.lock().len()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
        *self.best_value.lock() = None;
    }

    /// Records that improved the overall best, in arrival order
    pub fn best_trajectory(&self) -> Vec<ProgressRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.is_improvement)
            .cloned()
            .collect()
    }

    /// Best parameters and fitness over all records
    pub fn get_best_solution(&self) -> Option<(Vec<f64>, f64)> {
        self.best_trajectory()
            .last()
            .map(|r| (r.x.clone(), r.best_fitness))
    }
}

/// Export the visited-point log of a result as `run,step,x0..xN-1` rows.
///
/// Returns the number of rows written; 0 if point logging was disabled.
pub fn save_visited_points_csv(result: &OptimizationResult, path: impl AsRef<Path>) -> Result<usize> {
    let Some(visited) = result.visited_points.as_ref() else {
        return Ok(0);
    };
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    let dims = result.best_params.len();
    let mut header = vec!["run".to_string(), "step".to_string()];
    header.extend((0..dims).map(|i| format!("x{}", i)));
    writer.write_record(&header)?;

    let mut rows = 0;
    for (run, points) in visited.iter().enumerate() {
        for (step, point) in points.iter().enumerate() {
            let mut row = vec![run.to_string(), step.to_string()];
            row.extend(point.iter().map(|v| format!("{:.16}", v)));
            writer.write_record(&row)?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

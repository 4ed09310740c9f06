use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
}

/// 記錄每個 ETL 階段 (extract / transform / load) 的耗時與記憶體
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    phase_start: Instant,
    phases: Vec<PhaseStats>,
    peak_memory_mb: u64,
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            phase_start: now,
            phases: Vec::new(),
            peak_memory_mb: 0,
            #[cfg(feature = "cli")]
            system: if enabled {
                sysinfo::get_current_pid()
                    .ok()
                    .map(|pid| (System::new(), pid))
            } else {
                None
            },
        }
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        let (system, pid) = self.system.as_mut()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[*pid]), true);
        let memory_mb = system.process(*pid)?.memory() / 1024 / 1024;
        Some(memory_mb)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        None
    }

    /// 結束目前階段並開始計時下一個階段
    pub fn finish_phase(&mut self, phase: &str) {
        if !self.enabled {
            return;
        }

        let elapsed = self.phase_start.elapsed();
        let memory_usage_mb = self.sample_memory_mb();
        if let Some(mb) = memory_usage_mb {
            self.peak_memory_mb = self.peak_memory_mb.max(mb);
        }

        match memory_usage_mb {
            Some(mb) => tracing::info!("📊 {} - Time: {:?}, Memory: {}MB", phase, elapsed, mb),
            None => tracing::info!("📊 {} - Time: {:?}", phase, elapsed),
        }

        self.phases.push(PhaseStats {
            phase: phase.to_string(),
            elapsed,
            memory_usage_mb,
        });
        self.phase_start = Instant::now();
    }

    pub fn phases(&self) -> &[PhaseStats] {
        &self.phases
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.start_time.elapsed(),
            self.peak_memory_mb
        );
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

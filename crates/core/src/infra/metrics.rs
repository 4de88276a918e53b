use serde::Serialize;
use parking_lot::Mutex;

use crate::domain::speech::CaptureStatus;

/// ローカルメトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    rounds_started: u64,
    rounds_completed: u64,
    rounds_canceled: u64,
    questions_asked: u64,
    answers_captured: u64,
    capture_no_answer: u64,
    capture_errors: u64,
    capture_unavailable: u64,
    remote_calls: u64,
    remote_fallbacks: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub rounds_started: u64,
    pub rounds_completed: u64,
    pub rounds_canceled: u64,
    pub questions_asked: u64,
    pub answers_captured: u64,
    pub capture_fallbacks: CaptureFallbacks,
    pub remote_calls: u64,
    pub remote_fallbacks: u64,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureFallbacks {
    pub no_answer: u64,
    pub error: u64,
    pub unavailable: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub speak: Option<f64>,
    pub listen: Option<f64>,
    pub evaluate: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_rounds_started(&self) {
        self.counters.lock().rounds_started += 1;
    }

    pub fn inc_rounds_completed(&self) {
        self.counters.lock().rounds_completed += 1;
    }

    pub fn inc_rounds_canceled(&self) {
        self.counters.lock().rounds_canceled += 1;
    }

    pub fn inc_questions_asked(&self) {
        self.counters.lock().questions_asked += 1;
    }

    /// 回答取得の結果を種別ごとに数える
    pub fn record_capture(&self, status: CaptureStatus) {
        let mut c = self.counters.lock();
        match status {
            CaptureStatus::Recognized => c.answers_captured += 1,
            CaptureStatus::NoAnswer => c.capture_no_answer += 1,
            CaptureStatus::Error => c.capture_errors += 1,
            CaptureStatus::Unavailable => c.capture_unavailable += 1,
        }
    }

    pub fn inc_remote_calls(&self) {
        self.counters.lock().remote_calls += 1;
    }

    pub fn inc_remote_fallbacks(&self) {
        self.counters.lock().remote_fallbacks += 1;
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock();
        latencies.push(record);
        // 最新1000件のみ保持
        if latencies.len() > 1000 {
            let excess = latencies.len() - 1000;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock();
        let latencies = self.latencies.lock();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            rounds_started: c.rounds_started,
            rounds_completed: c.rounds_completed,
            rounds_canceled: c.rounds_canceled,
            questions_asked: c.questions_asked,
            answers_captured: c.answers_captured,
            capture_fallbacks: CaptureFallbacks {
                no_answer: c.capture_no_answer,
                error: c.capture_errors,
                unavailable: c.capture_unavailable,
            },
            remote_calls: c.remote_calls,
            remote_fallbacks: c.remote_fallbacks,
            avg_latency_ms: AvgLatency {
                speak: avg("speak"),
                listen: avg("listen"),
                evaluate: avg("evaluate"),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = Metrics::new();
        m.inc_rounds_started();
        m.inc_rounds_started();
        m.inc_rounds_completed();
        m.inc_questions_asked();
        m.record_capture(CaptureStatus::Recognized);
        m.record_capture(CaptureStatus::NoAnswer);
        m.record_capture(CaptureStatus::Unavailable);
        m.inc_remote_calls();
        m.inc_remote_fallbacks();

        let s = m.summary();
        assert_eq!(s.rounds_started, 2);
        assert_eq!(s.rounds_completed, 1);
        assert_eq!(s.questions_asked, 1);
        assert_eq!(s.answers_captured, 1);
        assert_eq!(s.capture_fallbacks.no_answer, 1);
        assert_eq!(s.capture_fallbacks.unavailable, 1);
        assert_eq!(s.capture_fallbacks.error, 0);
        assert_eq!(s.remote_fallbacks, 1);
    }

    #[test]
    fn test_latency_recording() {
        let m = Metrics::new();
        m.record_latency("listen", 120);
        m.record_latency("listen", 80);
        m.record_latency("evaluate", 200);

        let s = m.summary();
        assert!((s.avg_latency_ms.listen.unwrap() - 100.0).abs() < f64::EPSILON);
        assert!((s.avg_latency_ms.evaluate.unwrap() - 200.0).abs() < f64::EPSILON);
        assert!(s.avg_latency_ms.speak.is_none());
        assert_eq!(s.recent_latencies.len(), 3);
    }

    #[test]
    fn test_latency_cap() {
        let m = Metrics::new();
        for i in 0..1100 {
            m.record_latency("speak", i);
        }
        assert_eq!(m.latencies.lock().len(), 1000);
    }
}

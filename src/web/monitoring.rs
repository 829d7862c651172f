//! Process and host statistics for the monitoring page.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

/// Statistics about this process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessStats {
    /// CPU usage percentage
    pub cpu: f32,
    /// Resident memory in bytes
    pub ram: u64,
    /// Metric cycles currently in flight
    pub conns: usize,
}

/// Statistics about the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsStats {
    /// Average CPU usage percentage across cores
    pub cpu: f32,
    /// Used memory in bytes
    pub ram: u64,
    /// Total memory in bytes
    pub total_ram: u64,
    /// One-minute load average
    pub load_avg: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    pub pid: ProcessStats,
    pub os: OsStats,
}

/// Samples process and host statistics with sysinfo.
pub struct ProcessMonitor {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMonitor {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot determine own pid, process stats disabled: {}", e);
                None
            }
        };

        Self {
            system: System::new(),
            pid,
        }
    }

    /// Refresh and return the current statistics.
    pub fn sample(&mut self, in_flight: usize) -> MonitorStats {
        self.system.refresh_all();

        let (cpu, ram) = self
            .pid
            .and_then(|pid| self.system.process(pid))
            .map(|p| (p.cpu_usage(), p.memory()))
            .unwrap_or_default();

        let cpus = self.system.cpus();
        let os_cpu = if cpus.is_empty() {
            0.0
        } else {
            cpus.iter().map(|c| c.cpu_usage()).sum::<f32>() / cpus.len() as f32
        };

        MonitorStats {
            pid: ProcessStats {
                cpu,
                ram,
                conns: in_flight,
            },
            os: OsStats {
                cpu: os_cpu,
                ram: self.system.used_memory(),
                total_ram: self.system.total_memory(),
                load_avg: System::load_average().one,
            },
        }
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the monitoring page. It polls itself for JSON once per second.
pub fn render_page(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; margin: 2rem; }}
        td {{ padding: 0.25rem 1rem; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <table>
        <tr><td>Process CPU</td><td id="pid-cpu">-</td></tr>
        <tr><td>Process RAM</td><td id="pid-ram">-</td></tr>
        <tr><td>In-flight cycles</td><td id="pid-conns">-</td></tr>
        <tr><td>Host CPU</td><td id="os-cpu">-</td></tr>
        <tr><td>Host RAM</td><td id="os-ram">-</td></tr>
        <tr><td>Load average</td><td id="os-load">-</td></tr>
    </table>
    <script>
        const mb = (b) => (b / 1024 / 1024).toFixed(1) + ' MB';
        async function refresh() {{
            const res = await fetch(window.location.pathname, {{ headers: {{ Accept: 'application/json' }} }});
            const s = await res.json();
            document.getElementById('pid-cpu').textContent = s.pid.cpu.toFixed(1) + '%';
            document.getElementById('pid-ram').textContent = mb(s.pid.ram);
            document.getElementById('pid-conns').textContent = s.pid.conns;
            document.getElementById('os-cpu').textContent = s.os.cpu.toFixed(1) + '%';
            document.getElementById('os-ram').textContent = mb(s.os.ram) + ' / ' + mb(s.os.total_ram);
            document.getElementById('os-load').textContent = s.os.load_avg.toFixed(2);
        }}
        refresh();
        setInterval(refresh, 1000);
    </script>
</body>
</html>"#,
        title = title
    )
}

/// Encoder progress accumulated from `ffmpeg -progress` key/value lines.
///
/// Also accepts the classic stderr status line (`frame=  12 fps=... time=00:00:00.48 ...`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodeProgress {
    /// Last reported output frame number.
    pub frame: Option<u64>,
    /// Last reported output timestamp in seconds.
    pub out_time_secs: Option<f64>,
    /// `progress=end` was seen.
    pub complete: bool,
}

impl EncodeProgress {
    /// Apply one `key=value` pair.
    pub fn update(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key.trim() {
            "frame" => {
                if let Ok(n) = value.parse::<u64>() {
                    self.frame = Some(n);
                }
            }
            // `out_time_ms` is in microseconds despite its name.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>()
                    && us >= 0.0
                {
                    self.out_time_secs = Some(us / 1_000_000.0);
                }
            }
            "out_time" | "time" => {
                if let Some(secs) = parse_timestamp(value) {
                    self.out_time_secs = Some(secs);
                }
            }
            "progress" => self.complete = value == "end",
            _ => {}
        }
    }

    /// Apply one output line. Returns `true` when the line closes a progress block.
    pub fn feed_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return false;
        }
        if line.starts_with("progress=") {
            if let Some((k, v)) = line.split_once('=') {
                self.update(k, v);
            }
            return true;
        }
        for (key, value) in split_pairs(line) {
            self.update(key, value);
        }
        false
    }

    /// Completed fraction in `[0, 1]`, preferring frame counts over timestamps.
    pub fn fraction(&self, total_frames: u64, total_duration_secs: f64) -> f64 {
        if self.complete {
            return 1.0;
        }
        let frac = match (self.frame, self.out_time_secs) {
            (Some(frame), _) if total_frames > 0 => frame as f64 / total_frames as f64,
            (_, Some(secs)) if total_duration_secs > 0.0 => secs / total_duration_secs,
            _ => 0.0,
        };
        if frac.is_finite() {
            frac.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

// Stderr status lines pad values after `=` (`frame=  12`), so tokens are re-joined.
fn split_pairs(line: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let end = after.find(char::is_whitespace).unwrap_or(after.len());
        let value = &after[..end];
        if !key.is_empty() && !key.contains(char::is_whitespace) {
            out.push((key, value));
        } else if let Some(last) = key.split_whitespace().last() {
            out.push((last, value));
        }
        rest = &after[end..];
    }
    out
}

/// Parse `HH:MM:SS(.frac)` into seconds. Rejects `N/A` and negative stamps.
pub fn parse_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.starts_with('-') {
        return None;
    }
    let mut parts = s.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let sec: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let total = h * 3600.0 + m * 60.0 + sec;
    total.is_finite().then_some(total)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/progress.rs"]
mod tests;

//! Tagged lyric text parsing and the time-cursor over the resulting timeline.

/// A single lyric line with its start time in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct LyricEntry {
    pub time: f64,
    pub text: String,
}

/// An immutable, time-sorted sequence of lyric entries.
///
/// Timelines are replaced wholesale when new content arrives; they are never
/// mutated in place. Duplicate timestamps are legal and keep source order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<LyricEntry>,
}

impl Timeline {
    /// Parse bracketed time-tagged lyric text into a sorted timeline.
    ///
    /// Tags look like `[mm:ss]`, `[mm:ss.f]`, `[mm:ss.ff]` or `[mm:ss.fff]`
    /// (`:` is also accepted as the fractional separator) and may appear
    /// anywhere in a line; each tag yields one entry carrying the line's
    /// tag-stripped text. Lines without any valid tag, and lines whose text is
    /// empty after stripping, produce no entries. Malformed tags are skipped
    /// without failing the parse.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut entries = Vec::new();
        for raw in input.lines() {
            let (times, stripped) = strip_time_tags(raw);
            if times.is_empty() {
                continue;
            }
            let text = stripped.trim();
            if text.is_empty() {
                continue;
            }
            for time in times {
                entries.push(LyricEntry {
                    time,
                    text: text.to_string(),
                });
            }
        }
        // Stable sort keeps source order for equal timestamps
        entries.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[LyricEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Index of the greatest entry with `time <= t`, if any
    #[must_use]
    pub fn active_index(&self, t: f64) -> Option<usize> {
        self.entries.iter().rposition(|e| e.time <= t)
    }

    /// Start and end of the animation window for the line at `index`.
    ///
    /// The end is the next entry's start, or `start + fallback` for the final
    /// line so its animation window stays finite.
    #[must_use]
    pub fn line_window(&self, index: usize, fallback: f64) -> Option<(f64, f64)> {
        let start = self.entries.get(index)?.time;
        let end = self
            .entries
            .get(index + 1)
            .map_or(start + fallback, |next| next.time);
        Some((start, end))
    }

    /// Entry minimizing `|entry.time - t|`, accepted only within `window`.
    ///
    /// Used to pair a translation line with the active primary line; a miss
    /// beyond the window means "no translation for this line" rather than
    /// showing a stale or misaligned one.
    #[must_use]
    pub fn nearest_within(&self, t: f64, window: f64) -> Option<&LyricEntry> {
        let mut best: Option<(f64, &LyricEntry)> = None;
        for entry in &self.entries {
            let diff = (entry.time - t).abs();
            if best.map_or(true, |(d, _)| diff < d) {
                best = Some((diff, entry));
            }
            if entry.time - t > window {
                break;
            }
        }
        best.and_then(|(diff, entry)| (diff <= window).then_some(entry))
    }
}

/// Remove every valid time tag from `line`, returning the parsed times and the
/// remaining text. Bracketed groups that are not valid time tags stay in the
/// text untouched.
fn strip_time_tags(line: &str) -> (Vec<f64>, String) {
    let mut times = Vec::new();
    let mut text = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('[') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            // Unterminated bracket: keep the remainder verbatim
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let body = &after[..close];
        if let Some(time) = parse_time_tag(body) {
            times.push(time);
        } else {
            text.push('[');
            text.push_str(body);
            text.push(']');
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);
    (times, text)
}

/// Parse a tag body of the form `mm:ss`, `mm:ss.f`, `mm:ss.ff` or `mm:ss.fff`.
///
/// Fraction digits scale by position: one digit is tenths, two are hundredths,
/// three are milliseconds.
fn parse_time_tag(body: &str) -> Option<f64> {
    let (minutes, rest) = body.split_once(':')?;
    if !is_digits(minutes, 1, 2) {
        return None;
    }
    let (seconds, fraction) = match rest.split_once(['.', ':']) {
        Some((s, f)) => (s, Some(f)),
        None => (rest, None),
    };
    if !is_digits(seconds, 1, 2) {
        return None;
    }
    let millis: u32 = match fraction {
        None => 0,
        Some(f) => {
            if !is_digits(f, 1, 3) {
                return None;
            }
            let value: u32 = f.parse().ok()?;
            match f.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
    };
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    Some(f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(millis) / 1000.0)
}

fn is_digits(s: &str, min_len: usize, max_len: usize) -> bool {
    (min_len..=max_len).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

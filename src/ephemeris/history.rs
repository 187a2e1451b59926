//! Versioned per-satellite ephemeris store.
//!
//! Entries are kept in nondecreasing time-tag order; within one time tag,
//! higher priority comes first. Entry 0 is a permanent invalid sentinel so
//! the selection cursor always refers to something.

use crate::{ephemeris::Ephemeris, time::GpsTime};

/// Reference times are quantized to this step when deriving time tags.
pub const TIME_QUANTIZATION_S: f64 = 10.0;

/// One stored record with its bookkeeping.
#[derive(Debug, Clone)]
pub struct Entry {
    pub ephemeris: Ephemeris,
    pub priority: i32,
    pub t_tag: i32,
}

/// Iteration order over a history.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum IterMode {
    /// Chronological; ties keep their stored order (highest priority
    /// first).
    #[default]
    All,
    /// Chronological; ties are emitted lowest priority first.
    AllInverted,
    /// One entry per time tag, the highest priority one.
    NoRedundant,
}

#[derive(Debug, Clone)]
pub struct EphemerisHistory {
    entries: Vec<Entry>,
    selected: usize,
}

impl Default for EphemerisHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemerisHistory {
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                ephemeris: Ephemeris::default(),
                priority: 0,
                t_tag: 0,
            }],
            selected: 0,
        }
    }

    /// Quantized time tag, saturating at the i32 range.
    pub fn t_tag_of_seconds(total_seconds: f64) -> i32 {
        let tag = ((total_seconds + 0.5 * TIME_QUANTIZATION_S) / TIME_QUANTIZATION_S).floor();
        if tag >= i32::MAX as f64 {
            i32::MAX
        } else if tag <= i32::MIN as f64 {
            i32::MIN
        } else {
            tag as i32
        }
    }

    pub fn t_tag_of(time: &GpsTime) -> i32 {
        Self::t_tag_of_seconds(time.total_seconds())
    }

    fn t_tag(ephemeris: &Ephemeris) -> i32 {
        Self::t_tag_of(&ephemeris.base_time())
    }

    /// The currently selected record (the sentinel until anything better
    /// is picked).
    pub fn current(&self) -> &Ephemeris {
        &self.entries[self.selected].ephemeris
    }

    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers `item`, assumed to be the latest reception.
    ///
    /// When an equivalent record already exists, `priority_delta` is added
    /// to its priority and the entry is re-ordered among its time-tag
    /// peers; `priority_delta == 0` replaces the stored fields instead.
    /// Otherwise the record is inserted behind every strictly higher
    /// priority peer, with `priority_delta` as its initial priority. The
    /// selection cursor keeps referring to the record it referred to
    /// before.
    pub fn add(&mut self, item: Ephemeris, priority_delta: i32) {
        let t_tag_new = Self::t_tag(&item);
        let mut insert_at = 0usize;

        let mut index = self.entries.len();
        while index > 0 {
            index -= 1;

            let delta_t_tag = t_tag_new - self.entries[index].t_tag;
            if delta_t_tag < 0 {
                // adding item is older
                continue;
            }

            insert_at = index + 1;
            if delta_t_tag > 0 {
                // adding item is newer
                break;
            }

            // walk the group sharing this time tag
            loop {
                if !self.entries[index].ephemeris.is_equivalent(&item) {
                    if self.entries[index].priority <= priority_delta {
                        insert_at = index;
                    }
                    if index == 0 || self.entries[index - 1].t_tag < t_tag_new {
                        break;
                    }
                    index -= 1;
                    continue;
                }

                // equivalent content already registered
                if priority_delta == 0 {
                    // replace with the newer reception
                    self.entries[index].ephemeris = item;
                    self.entries[index].t_tag = t_tag_new;
                    return;
                }

                let rel_pos = self.selected as i64 - index as i64;
                let mut shift = 0i64;
                self.entries[index].priority += priority_delta;
                let promoted = self.entries[index].clone();

                let mut at = index;
                if priority_delta > 0 {
                    // priority increased, move toward the group front
                    while at > 0
                        && self.entries[at - 1].t_tag == t_tag_new
                        && self.entries[at - 1].priority <= promoted.priority
                    {
                        self.entries[at] = self.entries[at - 1].clone();
                        at -= 1;
                        shift -= 1;
                    }
                } else {
                    // priority decreased, move toward the group back
                    while at + 1 < self.entries.len()
                        && self.entries[at + 1].t_tag == t_tag_new
                        && self.entries[at + 1].priority > promoted.priority
                    {
                        self.entries[at] = self.entries[at + 1].clone();
                        at += 1;
                        shift += 1;
                    }
                }
                if shift != 0 {
                    self.entries[at] = promoted;
                }

                if rel_pos == 0 {
                    // the moved entry was the selected one
                    self.selected = (self.selected as i64 + shift) as usize;
                } else if rel_pos < 0 && shift <= rel_pos {
                    self.selected += 1;
                } else if rel_pos > 0 && shift >= rel_pos {
                    self.selected -= 1;
                }

                return;
            }

            // same time tag, different content: insertion point settled
            break;
        }

        if insert_at <= self.selected {
            self.selected += 1;
        }
        self.entries.insert(
            insert_at,
            Entry {
                ephemeris: item,
                priority: priority_delta,
                t_tag: t_tag_new,
            },
        );
    }

    /// Re-selects the best valid record for `target_time`, preferring the
    /// smallest time distance as measured by `get_delta_t` (the quantized
    /// tag distance when absent). Returns true when the cursor moved.
    pub fn select(
        &mut self,
        target_time: &GpsTime,
        is_valid: &dyn Fn(&Ephemeris, &GpsTime) -> bool,
        get_delta_t: Option<&dyn Fn(&Ephemeris, &GpsTime) -> f64>,
    ) -> bool {
        let t_tag_target = Self::t_tag_of(target_time);
        let mut t_tag = self.entries[self.selected].t_tag;
        let mut delta_t = match get_delta_t {
            Some(f) => f(self.current(), target_time),
            None => (t_tag_target - t_tag) as f64,
        };

        let range = if delta_t >= 0.0 {
            // find newer
            self.selected + 1..self.entries.len()
        } else {
            // find older (rare case, slow)
            delta_t = -delta_t;
            0..self.selected
        };

        // Valid entries having higher priority and smaller |delta_t| win;
        // once an entry of some time tag is picked its lower priority
        // peers are skipped.
        let mut changed = false;
        for index in range {
            if changed && t_tag == self.entries[index].t_tag {
                continue;
            }
            let candidate = &self.entries[index].ephemeris;
            if !is_valid(candidate, target_time) {
                continue;
            }
            let delta_t2 = match get_delta_t {
                Some(f) => f(candidate, target_time).abs(),
                None => ((t_tag_target - self.entries[index].t_tag) as f64).abs(),
            };
            if delta_t > delta_t2 {
                changed = true;
                t_tag = self.entries[index].t_tag;
                delta_t = delta_t2;
                self.selected = index;
            }
        }

        changed
    }

    /// Zipper-merges `other` into this history by ascending time tag.
    /// Equivalent records collapse into one (ours when `keep_original`);
    /// distinct records sharing a time tag keep the higher priority one
    /// first. The cursor follows the record it referred to.
    pub fn merge(&mut self, other: &EphemerisHistory, keep_original: bool) {
        let mut merged = vec![self.entries[0].clone()];
        let mut selected_new = self.selected;
        let mut shift_count = self.selected as i64 - 1;

        let mut index1 = 1usize;
        let mut index2 = 1usize;
        loop {
            if index1 == self.entries.len() {
                merged.extend(other.entries[index2..].iter().cloned());
                break;
            }
            if index2 == other.entries.len() {
                merged.extend(self.entries[index1..].iter().cloned());
                break;
            }

            let e1 = &self.entries[index1];
            let e2 = &other.entries[index2];
            let delta = e1.t_tag - e2.t_tag;
            let mut use_own = true;
            if delta == 0 {
                if e1.ephemeris.is_equivalent(&e2.ephemeris) {
                    merged.push(if keep_original { e1.clone() } else { e2.clone() });
                    index1 += 1;
                    index2 += 1;
                    shift_count -= 1;
                    continue;
                }
                if e1.priority < e2.priority {
                    use_own = false;
                }
            } else if delta > 0 {
                use_own = false;
            }

            if use_own {
                merged.push(e1.clone());
                index1 += 1;
                shift_count -= 1;
            } else {
                merged.push(e2.clone());
                index2 += 1;
                if shift_count >= 0 {
                    selected_new += 1;
                }
            }
        }

        self.entries = merged;
        self.selected = selected_new;
    }

    /// Iterates the stored records (the sentinel excluded).
    pub fn iter(&self, mode: IterMode) -> Box<dyn Iterator<Item = &Entry> + '_> {
        let items = &self.entries[1..];
        match mode {
            IterMode::All => Box::new(items.iter()),
            IterMode::AllInverted => Box::new(
                items
                    .chunk_by(|a, b| a.t_tag == b.t_tag)
                    .flat_map(|group| group.iter().rev()),
            ),
            IterMode::NoRedundant => Box::new(
                items
                    .chunk_by(|a, b| a.t_tag == b.t_tag)
                    .map(|group| &group[0]),
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

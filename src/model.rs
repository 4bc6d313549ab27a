use serde::Serialize;

/// Records without a section column land here, so the unsectioned system is
/// literally a system with exactly one section.
pub const DEFAULT_SECTION: &str = "General";

/// One flat ingestion record, as produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub section: Option<String>,
    pub name: String,
    pub week: usize,
    pub quiz: i64,
    pub lab: i64,
}

impl Record {
    pub fn section_name(&self) -> &str {
        self.section.as_deref().unwrap_or(DEFAULT_SECTION)
    }
}

/// One trainee's scores for one week. The total is always derived; it is
/// never stored alongside quiz/lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub name: String,
    pub quiz: i64,
    pub lab: i64,
}

impl ScoreEntry {
    pub fn zero(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quiz: 0,
            lab: 0,
        }
    }

    pub fn total(&self) -> i64 {
        self.quiz + self.lab
    }
}

#[derive(Debug, Clone, Default)]
pub struct Week {
    entries: Vec<ScoreEntry>,
}

impl Week {
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }
}

/// One row of a trainee's per-week series. Weeks with no entry read as zero
/// with `present = false`; the trend analyzer filters on `present` while the
/// detail view shows the zero-filled row as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekScore {
    pub week: usize,
    pub quiz: i64,
    pub lab: i64,
    pub total: i64,
    pub present: bool,
}

/// A named cohort with its own member list, ordered week sequence, and
/// current-week cursor. Week index is id, sort key, and display label at
/// once; the sequence never has holes.
#[derive(Debug)]
pub struct SectionState {
    name: String,
    members: Vec<String>,
    weeks: Vec<Week>,
    current_week: Option<usize>,
}

impl SectionState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            members: Vec::new(),
            weeks: Vec::new(),
            current_week: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in first-seen order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn current_week(&self) -> Option<usize> {
        self.current_week
    }

    /// The week's entries, or empty when the index is out of range. Reads
    /// are total: absence is "no data", not an error.
    pub fn snapshot(&self, week: usize) -> &[ScoreEntry] {
        self.weeks.get(week).map(Week::entries).unwrap_or(&[])
    }

    pub fn entry(&self, week: usize, name: &str) -> Option<&ScoreEntry> {
        self.snapshot(week).iter().find(|e| e.name == name)
    }

    fn ensure_member(&mut self, name: &str) {
        if !self.members.iter().any(|m| m == name) {
            self.members.push(name.to_string());
        }
    }

    /// Extends the sequence with empty weeks until `week` is a valid index.
    fn ensure_week(&mut self, week: usize) {
        while self.weeks.len() <= week {
            self.weeks.push(Week::default());
        }
    }
}

/// The in-memory model: global roster, sections, and a revision counter the
/// presentation layer polls to decide when to redraw. All mutation goes
/// through this one owned value.
#[derive(Debug, Default)]
pub struct Store {
    roster: Vec<String>,
    sections: Vec<SectionState>,
    revision: u64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Global roster in first-seen order. Always a superset of every name
    /// appearing in any week of any section.
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    pub fn sections(&self) -> &[SectionState] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&SectionState> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn ensure_roster(&mut self, name: &str) {
        if !self.roster.iter().any(|n| n == name) {
            self.roster.push(name.to_string());
        }
    }

    /// Sections are created on first write; reads never create.
    fn section_mut(&mut self, name: &str) -> &mut SectionState {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(i) => i,
            None => {
                self.sections.push(SectionState::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Clears the roster and every section's week sequence.
    pub fn reset(&mut self) {
        self.roster.clear();
        self.sections.clear();
        self.revision += 1;
    }

    /// Idempotent upsert-by-(student, week, section): the roster and member
    /// list grow in first-seen order, the week sequence is extended without
    /// gaps, and within a week an existing entry is replaced, never
    /// duplicated.
    pub fn upsert(&mut self, rec: &Record) {
        self.ensure_roster(&rec.name);
        let sec = self.section_mut(rec.section_name());
        sec.ensure_member(&rec.name);
        sec.ensure_week(rec.week);
        let week = &mut sec.weeks[rec.week];
        match week.entries.iter_mut().find(|e| e.name == rec.name) {
            Some(e) => {
                e.quiz = rec.quiz;
                e.lab = rec.lab;
            }
            None => week.entries.push(ScoreEntry {
                name: rec.name.clone(),
                quiz: rec.quiz,
                lab: rec.lab,
            }),
        }
        self.revision += 1;
    }

    /// Appends a week pre-populated with a zero entry for every current
    /// member and moves the cursor to it. Returns the new index.
    pub fn add_week(&mut self, section: &str) -> usize {
        let sec = self.section_mut(section);
        let entries = sec.members.iter().map(|m| ScoreEntry::zero(m)).collect();
        sec.weeks.push(Week { entries });
        let idx = sec.weeks.len() - 1;
        sec.current_week = Some(idx);
        self.revision += 1;
        idx
    }

    /// Moves the cursor. Out-of-range indices are ignored so the cursor
    /// stays a valid index (or absent while the sequence is empty).
    pub fn set_current_week(&mut self, section: &str, week: usize) {
        if let Some(sec) = self.sections.iter_mut().find(|s| s.name == section) {
            if week < sec.weeks.len() {
                sec.current_week = Some(week);
                self.revision += 1;
            }
        }
    }

    pub fn snapshot(&self, section: &str, week: usize) -> &[ScoreEntry] {
        self.section(section).map(|s| s.snapshot(week)).unwrap_or(&[])
    }

    /// Replaces one week's entries wholesale. Used by the ranking commit:
    /// whatever was computed becomes the week's authoritative content, in
    /// ranked order. Extends the sequence if needed and folds unseen names
    /// into the roster and member list so the superset invariant holds.
    pub fn commit_week(&mut self, section: &str, week: usize, entries: Vec<ScoreEntry>) {
        for e in &entries {
            self.ensure_roster(&e.name);
        }
        let sec = self.section_mut(section);
        for e in &entries {
            sec.ensure_member(&e.name);
        }
        sec.ensure_week(week);
        sec.weeks[week].entries = entries;
        self.revision += 1;
    }

    /// Zero-filled per-week series for one trainee over the section's whole
    /// sequence. Empty for an unknown section.
    pub fn history(&self, section: &str, name: &str) -> Vec<WeekScore> {
        let Some(sec) = self.section(section) else {
            return Vec::new();
        };
        (0..sec.week_count())
            .map(|w| match sec.entry(w, name) {
                Some(e) => WeekScore {
                    week: w,
                    quiz: e.quiz,
                    lab: e.lab,
                    total: e.total(),
                    present: true,
                },
                None => WeekScore {
                    week: w,
                    quiz: 0,
                    lab: 0,
                    total: 0,
                    present: false,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, week: usize, quiz: i64, lab: i64) -> Record {
        Record {
            section: None,
            name: name.to_string(),
            week,
            quiz,
            lab,
        }
    }

    #[test]
    fn upsert_is_idempotent_per_student_week() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 50, 60));
        store.upsert(&rec("Alice", 0, 70, 80));

        let snap = store.snapshot(DEFAULT_SECTION, 0);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].quiz, 70);
        assert_eq!(snap[0].lab, 80);
        assert_eq!(store.roster(), ["Alice".to_string()]);
    }

    #[test]
    fn sparse_week_indices_leave_no_gaps() {
        let mut store = Store::new();
        for w in [0, 2, 5] {
            store.upsert(&rec("Alice", w, 10, 10));
        }
        let sec = store.section(DEFAULT_SECTION).expect("section");
        assert_eq!(sec.week_count(), 6);
        for w in [1, 3, 4] {
            assert!(sec.snapshot(w).is_empty(), "week {} should be empty", w);
        }
    }

    #[test]
    fn roster_is_superset_of_week_entries() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 1, 2));
        store.upsert(&rec("Bob", 3, 4, 5));
        store.add_week(DEFAULT_SECTION);
        store.commit_week(
            DEFAULT_SECTION,
            1,
            vec![ScoreEntry {
                name: "Carol".to_string(),
                quiz: 9,
                lab: 9,
            }],
        );

        let sec = store.section(DEFAULT_SECTION).expect("section");
        for w in 0..sec.week_count() {
            for entry in sec.snapshot(w) {
                assert!(
                    store.roster().contains(&entry.name),
                    "{} missing from roster",
                    entry.name
                );
                assert!(sec.members().contains(&entry.name));
            }
        }
    }

    #[test]
    fn add_week_zero_fills_members_and_moves_cursor() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 50, 50));
        store.upsert(&rec("Bob", 0, 60, 60));

        let idx = store.add_week(DEFAULT_SECTION);
        assert_eq!(idx, 1);
        let sec = store.section(DEFAULT_SECTION).expect("section");
        assert_eq!(sec.current_week(), Some(1));
        let snap = sec.snapshot(1);
        assert_eq!(snap.len(), 2);
        assert!(snap.iter().all(|e| e.quiz == 0 && e.lab == 0));
        assert_eq!(snap[0].name, "Alice");
        assert_eq!(snap[1].name, "Bob");
    }

    #[test]
    fn set_current_week_ignores_out_of_range() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 1, 10, 10));
        store.set_current_week(DEFAULT_SECTION, 1);
        store.set_current_week(DEFAULT_SECTION, 7);

        let sec = store.section(DEFAULT_SECTION).expect("section");
        assert_eq!(sec.current_week(), Some(1));
    }

    #[test]
    fn reads_are_total_for_missing_data() {
        let store = Store::new();
        assert!(store.snapshot("Nowhere", 3).is_empty());
        assert!(store.history("Nowhere", "Alice").is_empty());

        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 10, 10));
        assert!(store.snapshot(DEFAULT_SECTION, 9).is_empty());
    }

    #[test]
    fn sections_keep_independent_week_sequences() {
        let mut store = Store::new();
        let mut foundation = rec("Alice", 4, 10, 10);
        foundation.section = Some("Foundation".to_string());
        let mut advanced = rec("Bob", 1, 20, 20);
        advanced.section = Some("Advanced".to_string());
        store.upsert(&foundation);
        store.upsert(&advanced);

        assert_eq!(store.section("Foundation").expect("f").week_count(), 5);
        assert_eq!(store.section("Advanced").expect("a").week_count(), 2);
        assert_eq!(store.roster(), ["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(
            store.section("Foundation").expect("f").members(),
            ["Alice".to_string()]
        );
    }

    #[test]
    fn history_zero_fills_absent_weeks() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 80, 70));
        store.upsert(&rec("Bob", 1, 40, 30));

        let h = store.history(DEFAULT_SECTION, "Alice");
        assert_eq!(h.len(), 2);
        assert!(h[0].present);
        assert_eq!(h[0].total, 150);
        assert!(!h[1].present);
        assert_eq!(h[1].total, 0);
    }

    #[test]
    fn reset_clears_everything_and_bumps_revision() {
        let mut store = Store::new();
        store.upsert(&rec("Alice", 0, 1, 1));
        let before = store.revision();
        store.reset();
        assert!(store.revision() > before);
        assert!(store.roster().is_empty());
        assert!(store.sections().is_empty());
    }
}

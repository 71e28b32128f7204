use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_json::Value;

use super::entitlement::EntitlementService;
use super::entry::{BackupPayload, Entry, FREE_ENTRY_LIMIT, MAX_ENTRY_CHARS, palette_color};
use super::parse::{is_truthy, parse_entries, parse_premium, sanitize_values};
use super::storage::KeyValueStore;

pub const ENTRIES_KEY: &str = "gratitude_entries";
pub const PREMIUM_KEY: &str = "is_premium";
const BACKUP_VERSION: u32 = 1;

/// Owns the journal entries and the premium flag for one application
/// session. Every mutation is persisted before it becomes visible.
pub struct JournalStore {
    storage: Box<dyn KeyValueStore>,
    entitlement: Box<dyn EntitlementService>,
    entries: Vec<Entry>,
    is_premium: bool,
    revision: u64,
}

impl JournalStore {
    pub fn load(
        mut storage: Box<dyn KeyValueStore>,
        entitlement: Box<dyn EntitlementService>,
    ) -> Result<Self> {
        let entries = match storage.get(ENTRIES_KEY)? {
            Some(raw) => match parse_entries(&raw) {
                Ok(entries) => entries,
                Err(error) => {
                    warn!("event=journal_load status=corrupt key={ENTRIES_KEY} error={error:#}");
                    storage.remove(ENTRIES_KEY)?;
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut is_premium = match storage.get(PREMIUM_KEY)? {
            Some(raw) => match parse_premium(&raw) {
                Ok(flag) => flag,
                Err(error) => {
                    warn!("event=journal_load status=corrupt key={PREMIUM_KEY} error={error:#}");
                    storage.remove(PREMIUM_KEY)?;
                    false
                }
            },
            None => false,
        };

        match entitlement.is_premium() {
            Ok(true) if !is_premium => {
                storage.set(PREMIUM_KEY, "true")?;
                is_premium = true;
            }
            Ok(_) => {}
            Err(error) => warn!("event=entitlement_sync status=failed error={error:#}"),
        }

        info!(
            "event=journal_load status=ok entries={} premium={is_premium}",
            entries.len()
        );

        Ok(Self {
            storage,
            entitlement,
            entries,
            is_premium,
            revision: 0,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    /// Bumped on every change to the entry list; consumers compare it to
    /// decide whether to relayout.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Free journals stop accepting entries at [`FREE_ENTRY_LIMIT`].
    pub fn can_add_entry(&self) -> bool {
        self.is_premium || self.entries.len() < FREE_ENTRY_LIMIT
    }

    /// Backup export and import are premium features.
    pub fn can_backup(&self) -> bool {
        self.is_premium
    }

    pub fn add_entry(&mut self, text: &str, now: DateTime<Utc>) -> Result<&Entry> {
        if !self.can_add_entry() {
            bail!("free journals are limited to {FREE_ENTRY_LIMIT} entries");
        }
        let text = normalize_text(text)?;

        let mut stamp = now.timestamp_millis();
        while self.entry(&stamp.to_string()).is_some() {
            stamp += 1;
        }

        let entry = Entry {
            id: stamp.to_string(),
            text,
            timestamp: now,
            color: palette_color(self.entries.len()).to_owned(),
        };

        let mut updated = self.entries.clone();
        updated.push(entry);
        self.save_entries(updated)?;
        self.entries
            .last()
            .ok_or_else(|| anyhow!("entry list is unexpectedly empty after insert"))
    }

    pub fn update_entry(&mut self, id: &str, text: &str) -> Result<bool> {
        let text = normalize_text(text)?;
        let Some(index) = self.entries.iter().position(|entry| entry.id == id) else {
            return Ok(false);
        };

        let mut updated = self.entries.clone();
        updated[index].text = text;
        self.save_entries(updated)?;
        info!("event=entry_update id={id}");
        Ok(true)
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<bool> {
        let updated = self
            .entries
            .iter()
            .filter(|entry| entry.id != id)
            .cloned()
            .collect::<Vec<_>>();
        if updated.len() == self.entries.len() {
            return Ok(false);
        }

        self.save_entries(updated)?;
        Ok(true)
    }

    pub fn upgrade_to_premium(&mut self) -> Result<()> {
        self.storage.set(PREMIUM_KEY, "true")?;
        self.is_premium = true;
        Ok(())
    }

    pub fn purchase_premium(&mut self) -> Result<bool> {
        if !self.entitlement.purchase().context("purchase failed")? {
            return Ok(false);
        }
        self.upgrade_to_premium()?;
        Ok(true)
    }

    pub fn restore_purchases(&mut self) -> Result<bool> {
        if !self.entitlement.restore().context("restore failed")? {
            return Ok(false);
        }
        self.upgrade_to_premium()?;
        Ok(true)
    }

    pub fn export_backup(&self, now: DateTime<Utc>) -> BackupPayload {
        BackupPayload {
            version: BACKUP_VERSION,
            exported_at: now,
            is_premium: self.is_premium,
            entries: self.entries.clone(),
        }
    }

    pub fn export_backup_json(&self, now: DateTime<Utc>) -> Result<String> {
        if !self.can_backup() {
            bail!("backup export requires premium");
        }
        serde_json::to_string_pretty(&self.export_backup(now)).context("failed to encode backup")
    }

    /// Replaces the journal with a backup. Incomplete entries inside the
    /// payload are skipped rather than failing the whole import.
    pub fn import_backup_json(&mut self, raw: &str) -> Result<usize> {
        if !self.can_backup() {
            bail!("backup import requires premium");
        }
        let payload: Value = serde_json::from_str(raw).context("backup is not valid JSON")?;
        let object = payload
            .as_object()
            .ok_or_else(|| anyhow!("backup must be a JSON object"))?;

        let entries = object
            .get("entries")
            .and_then(Value::as_array)
            .map(|items| sanitize_values(items))
            .unwrap_or_default();
        let is_premium = object
            .get("isPremium")
            .is_some_and(is_truthy);

        let count = entries.len();
        self.save_entries(entries)?;
        self.storage
            .set(PREMIUM_KEY, if is_premium { "true" } else { "false" })?;
        self.is_premium = is_premium;
        info!("event=backup_import status=ok entries={count} premium={is_premium}");
        Ok(count)
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.storage.remove_many(&[ENTRIES_KEY, PREMIUM_KEY])?;
        self.entries.clear();
        self.is_premium = false;
        self.revision += 1;
        Ok(())
    }

    fn save_entries(&mut self, entries: Vec<Entry>) -> Result<()> {
        let encoded = serde_json::to_string(&entries).context("failed to encode entries")?;
        self.storage
            .set(ENTRIES_KEY, &encoded)
            .context("failed to persist entries")?;
        self.entries = entries;
        self.revision += 1;
        Ok(())
    }
}

fn normalize_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("entry text is empty"));
    }
    Ok(trimmed.chars().take(MAX_ENTRY_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::journal::entitlement::LocalEntitlement;
    use crate::journal::storage::MemoryStore;

    struct BrokenEntitlement;

    impl EntitlementService for BrokenEntitlement {
        fn is_premium(&self) -> Result<bool> {
            Err(anyhow!("store unreachable"))
        }

        fn purchase(&mut self) -> Result<bool> {
            Err(anyhow!("store unreachable"))
        }

        fn restore(&mut self) -> Result<bool> {
            Ok(false)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn empty_store() -> JournalStore {
        store_with_tier(false)
    }

    fn store_with_tier(is_premium: bool) -> JournalStore {
        JournalStore::load(
            Box::new(MemoryStore::default()),
            Box::new(LocalEntitlement::new(is_premium)),
        )
        .expect("load")
    }

    #[test]
    fn corrupted_entries_are_cleared_on_load() {
        let storage = MemoryStore::default()
            .with_value(ENTRIES_KEY, "{not json")
            .with_value(PREMIUM_KEY, "true");
        let store =
            JournalStore::load(Box::new(storage), Box::new(LocalEntitlement::default())).unwrap();

        assert!(store.entries().is_empty());
        assert!(store.is_premium());
    }

    #[test]
    fn entitlement_grant_is_persisted_and_failure_is_not_fatal() {
        let granted = JournalStore::load(
            Box::new(MemoryStore::default()),
            Box::new(LocalEntitlement::new(true)),
        )
        .unwrap();
        assert!(granted.is_premium());
        assert_eq!(
            granted.storage.get(PREMIUM_KEY).unwrap().as_deref(),
            Some("true")
        );

        let offline =
            JournalStore::load(Box::new(MemoryStore::default()), Box::new(BrokenEntitlement))
                .unwrap();
        assert!(!offline.is_premium());
    }

    #[test]
    fn added_entries_cycle_palette_and_keep_insertion_order() {
        let mut store = empty_store();
        for index in 0..7 {
            store
                .add_entry(&format!("  thing {index}  "), now() + Duration::seconds(index))
                .unwrap();
        }

        let entries = store.entries();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0].text, "thing 0");
        assert_eq!(entries[1].color, "#B24BF3");
        assert_eq!(entries[6].color, entries[0].color);
        assert_eq!(store.revision(), 7);
    }

    #[test]
    fn colliding_timestamps_get_distinct_ids() {
        let mut store = empty_store();
        let first = store.add_entry("a", now()).unwrap().id.clone();
        let second = store.add_entry("b", now()).unwrap().id.clone();
        assert_ne!(first, second);
    }

    #[test]
    fn blank_text_is_rejected_and_long_text_is_capped() {
        let mut store = empty_store();
        assert!(store.add_entry("   ", now()).is_err());

        let long = "x".repeat(MAX_ENTRY_CHARS + 40);
        let entry = store.add_entry(&long, now()).unwrap();
        assert_eq!(entry.text.chars().count(), MAX_ENTRY_CHARS);
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let mut store = empty_store();
        let id = store.add_entry("coffee", now()).unwrap().id.clone();

        assert!(store.update_entry(&id, "good coffee").unwrap());
        assert_eq!(store.entry(&id).unwrap().text, "good coffee");
        assert!(!store.update_entry("missing", "x").unwrap());

        assert!(store.delete_entry(&id).unwrap());
        assert!(!store.delete_entry(&id).unwrap());
        assert!(store.entries().is_empty());
    }

    #[test]
    fn backup_export_then_import_restores_journal() {
        let mut source = empty_store();
        source.add_entry("friends", now()).unwrap();
        source.add_entry("music", now() + Duration::minutes(1)).unwrap();
        source.upgrade_to_premium().unwrap();
        let json = source.export_backup_json(now()).unwrap();

        let mut target = store_with_tier(true);
        let imported = target.import_backup_json(&json).unwrap();

        assert_eq!(imported, 2);
        assert_eq!(target.entries(), source.entries());
        assert!(target.is_premium());
    }

    #[test]
    fn import_skips_incomplete_entries_and_defaults_premium() {
        let raw = r##"{
            "version": 1,
            "entries": [
                {"id": "1", "text": "rain", "date": "2025-01-01T00:00:00Z", "color": "#10B981"},
                {"id": "2", "text": "missing date", "color": "#10B981"}
            ]
        }"##;
        let mut store = store_with_tier(true);

        assert_eq!(store.import_backup_json(raw).unwrap(), 1);
        assert!(!store.is_premium());
    }

    #[test]
    fn imported_premium_flag_uses_truthiness() {
        let mut store = store_with_tier(true);
        store
            .import_backup_json(r#"{"entries": [], "isPremium": 1}"#)
            .unwrap();
        assert!(store.is_premium());

        store
            .import_backup_json(r#"{"entries": [], "isPremium": ""}"#)
            .unwrap();
        assert!(!store.is_premium());
    }

    #[test]
    fn free_journal_stops_at_entry_limit() {
        let mut free = empty_store();
        let mut premium = store_with_tier(true);
        for index in 0..FREE_ENTRY_LIMIT {
            let at = now() + Duration::seconds(index as i64);
            free.add_entry("sunrise", at).unwrap();
            premium.add_entry("sunrise", at).unwrap();
        }

        assert!(!free.can_add_entry());
        assert!(free.add_entry("one more", now()).is_err());
        assert_eq!(free.entries().len(), FREE_ENTRY_LIMIT);
        assert_eq!(free.revision(), FREE_ENTRY_LIMIT as u64);

        assert!(premium.can_add_entry());
        premium.add_entry("one more", now()).unwrap();
        assert_eq!(premium.entries().len(), FREE_ENTRY_LIMIT + 1);
    }

    #[test]
    fn backup_requires_premium() {
        let mut store = empty_store();
        store.add_entry("walk", now()).unwrap();

        assert!(store.export_backup_json(now()).is_err());
        assert!(store.import_backup_json(r#"{"entries": []}"#).is_err());
        assert_eq!(store.entries().len(), 1);

        store.upgrade_to_premium().unwrap();
        assert!(store.export_backup_json(now()).is_ok());
    }

    #[test]
    fn purchase_grants_premium_and_clear_resets_everything() {
        let mut store = empty_store();
        store.add_entry("sleep", now()).unwrap();
        assert!(store.purchase_premium().unwrap());
        assert!(store.is_premium());

        store.clear_all().unwrap();
        assert!(store.entries().is_empty());
        assert!(!store.is_premium());
        assert_eq!(store.storage.get(ENTRIES_KEY).unwrap(), None);
    }

    #[test]
    fn failed_purchase_surfaces_error() {
        let mut store =
            JournalStore::load(Box::new(MemoryStore::default()), Box::new(BrokenEntitlement))
                .unwrap();
        assert!(store.purchase_premium().is_err());
        assert!(!store.restore_purchases().unwrap());
        assert!(!store.is_premium());
    }
}

use tracing::debug;

use crate::error::{DbError, Result};
use crate::models::Chirp;
use crate::{Database, moderation};

/// Listing order, by chirp id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `"desc"` sorts newest first; anything else, or nothing, is ascending.
    pub fn from_query(sort: Option<&str>) -> Self {
        match sort {
            Some(s) if s.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

impl Database {
    /// Moderate `body`, assign the next chirp id and persist.
    pub fn create_chirp(&self, body: &str, author_id: u64) -> Result<Chirp> {
        let body = moderation::enforce(body)?;

        let chirp = self.with_snapshot_mut(|snapshot, counters| {
            let chirp = Chirp {
                id: counters.next_chirp_id(),
                body,
                author_id: Some(author_id),
            };
            snapshot.chirps.insert(chirp.id, chirp.clone());
            Ok(chirp)
        })?;

        debug!("Created chirp {} by user {}", chirp.id, author_id);
        Ok(chirp)
    }

    /// All chirps, optionally restricted to one author.
    ///
    /// `author_id` is the raw filter value; an empty string means no filter.
    pub fn list_chirps(&self, author_id: Option<&str>, order: SortOrder) -> Result<Vec<Chirp>> {
        let author = author_id
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|_| DbError::InvalidFilter(raw.to_string()))
            })
            .transpose()?;

        self.with_snapshot(|snapshot| {
            let matching = snapshot
                .chirps
                .values()
                .filter(|chirp| author.is_none() || chirp.author_id == author)
                .cloned();

            // BTreeMap iteration is already ascending by id.
            let chirps: Vec<Chirp> = match order {
                SortOrder::Asc => matching.collect(),
                SortOrder::Desc => matching.rev().collect(),
            };
            Ok(chirps)
        })
    }

    pub fn get_chirp(&self, id: u64) -> Result<Chirp> {
        self.with_snapshot(|snapshot| {
            snapshot
                .chirps
                .get(&id)
                .cloned()
                .ok_or(DbError::ChirpNotFound(id))
        })
    }

    /// Remove a chirp. Only its author may delete it.
    pub fn delete_chirp(&self, id: u64, requester_id: u64) -> Result<()> {
        self.with_snapshot_mut(|snapshot, _| {
            let chirp = snapshot.chirps.get(&id).ok_or(DbError::ChirpNotFound(id))?;
            if chirp.author_id != Some(requester_id) {
                return Err(DbError::Forbidden {
                    chirp_id: id,
                    requester: requester_id,
                });
            }
            snapshot.chirps.remove(&id);
            Ok(())
        })?;

        debug!("Deleted chirp {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_db;

    #[test]
    fn create_and_list_scenario() {
        let (_dir, db) = temp_db();

        let first = db.create_chirp("hello world", 1).unwrap();
        assert_eq!(
            first,
            Chirp { id: 1, body: "hello world".into(), author_id: Some(1) }
        );

        let second = db.create_chirp("kerfuffle city", 2).unwrap();
        assert_eq!(
            second,
            Chirp { id: 2, body: "**** city".into(), author_id: Some(2) }
        );

        let ids: Vec<u64> = db
            .list_chirps(None, SortOrder::Desc)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2, 1]);

        let ids: Vec<u64> = db
            .list_chirps(None, SortOrder::Asc)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn too_long_is_not_persisted() {
        let (_dir, db) = temp_db();
        db.create_chirp("short", 1).unwrap();

        let err = db.create_chirp(&"x".repeat(141), 1).unwrap_err();
        assert_eq!(err.kind(), chirpy_types::error::ErrorKind::Validation);
        assert_eq!(db.load().unwrap().chirps.len(), 1);

        // The rejected chirp did not consume an id.
        assert_eq!(db.create_chirp("next", 1).unwrap().id, 2);
    }

    #[test]
    fn filter_by_author() {
        let (_dir, db) = temp_db();
        db.create_chirp("a", 1).unwrap();
        db.create_chirp("b", 2).unwrap();
        db.create_chirp("c", 1).unwrap();

        let bodies: Vec<String> = db
            .list_chirps(Some("1"), SortOrder::Asc)
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["a", "c"]);

        assert_eq!(db.list_chirps(Some(""), SortOrder::Asc).unwrap().len(), 3);
        assert!(db.list_chirps(Some("99"), SortOrder::Asc).unwrap().is_empty());
        assert!(matches!(
            db.list_chirps(Some("abc"), SortOrder::Asc),
            Err(DbError::InvalidFilter(_))
        ));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (_dir, db) = temp_db();
        let chirp = db.create_chirp("bye", 4).unwrap();

        db.delete_chirp(chirp.id, 4).unwrap();
        assert!(matches!(db.get_chirp(chirp.id), Err(DbError::ChirpNotFound(1))));
        assert!(matches!(db.delete_chirp(chirp.id, 4), Err(DbError::ChirpNotFound(1))));
    }

    #[test]
    fn delete_by_non_author_is_forbidden() {
        let (_dir, db) = temp_db();
        let chirp = db.create_chirp("mine", 4).unwrap();

        let err = db.delete_chirp(chirp.id, 5).unwrap_err();
        assert_eq!(err.kind(), chirpy_types::error::ErrorKind::Forbidden);
        assert_eq!(db.get_chirp(chirp.id).unwrap(), chirp);
    }

    #[test]
    fn ids_survive_deletion() {
        let (_dir, db) = temp_db();
        db.create_chirp("one", 1).unwrap();
        let two = db.create_chirp("two", 1).unwrap();
        db.delete_chirp(two.id, 1).unwrap();

        assert_eq!(db.create_chirp("three", 1).unwrap().id, 3);
    }

    #[test]
    fn sort_order_from_query() {
        assert_eq!(SortOrder::from_query(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::from_query(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::from_query(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::from_query(None), SortOrder::Asc);
    }
}

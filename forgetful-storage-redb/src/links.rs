//! Memory-to-memory links: canonicalized `(source_id, target_id)` pairs
//! with a unique-constraint check enforced via the link key itself.

use crate::tables::{link_key, MEMORY_LINKS_TABLE};
use crate::util::{decode_row, encode_row, internal, next_id};
use chrono::Utc;
use forgetful_core::error::{Error, Result};
use forgetful_core::types::{Id, Memory, MemoryLink, UserId};
use redb::{Database, ReadableTable};

use crate::memories::get_memory;

fn canonicalize(source_id: Id, target_id: Id) -> Result<(Id, Id)> {
    if source_id == target_id {
        return Err(Error::validation("target_id", "cannot link a memory to itself"));
    }
    Ok(if source_id < target_id {
        (source_id, target_id)
    } else {
        (target_id, source_id)
    })
}

pub(crate) fn create_link(db: &Database, user_id: UserId, source_id: Id, target_id: Id) -> Result<MemoryLink> {
    let (canon_source, canon_target) = canonicalize(source_id, target_id)?;
    get_memory(db, user_id, canon_source)?;
    get_memory(db, user_id, canon_target)?;

    let txn = db.begin_write().map_err(internal)?;
    let key = link_key(canon_source, canon_target);
    {
        let table = txn.open_table(MEMORY_LINKS_TABLE).map_err(internal)?;
        if table.get(key.as_str()).map_err(internal)?.is_some() {
            return Err(Error::AlreadyLinked {
                source_id: canon_source,
                target_id: canon_target,
            });
        }
    }
    let id = next_id(&txn, "memory_link")?;
    let link = MemoryLink {
        id,
        user_id,
        source_id: canon_source,
        target_id: canon_target,
        created_at: Utc::now(),
    };
    {
        let mut table = txn.open_table(MEMORY_LINKS_TABLE).map_err(internal)?;
        table.insert(key.as_str(), encode_row(&link)?.as_slice()).map_err(internal)?;
    }
    txn.commit().map_err(internal)?;
    Ok(link)
}

pub(crate) fn create_links_batch(
    db: &Database,
    user_id: UserId,
    source_id: Id,
    target_ids: &[Id],
) -> Result<Vec<MemoryLink>> {
    let mut created = Vec::new();
    for &target_id in target_ids {
        match create_link(db, user_id, source_id, target_id) {
            Ok(link) => created.push(link),
            Err(Error::AlreadyLinked { .. } | Error::Validation(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Ok(created)
}

pub(crate) fn get_linked_memories(
    db: &Database,
    user_id: UserId,
    memory_ids: &[Id],
    max_links_per_primary: usize,
) -> Result<Vec<(Id, Memory)>> {
    let txn = db.begin_read().map_err(internal)?;
    let table = txn.open_table(MEMORY_LINKS_TABLE).map_err(internal)?;
    let mut all_links: Vec<MemoryLink> = Vec::new();
    for entry in table.iter().map_err(internal)? {
        let (_key, value) = entry.map_err(internal)?;
        let link: MemoryLink = decode_row(value.value())?;
        if link.user_id == user_id {
            all_links.push(link);
        }
    }

    let mut out = Vec::new();
    for &primary_id in memory_ids {
        let mut count = 0usize;
        for link in &all_links {
            if count >= max_links_per_primary {
                break;
            }
            let neighbor_id = if link.source_id == primary_id {
                Some(link.target_id)
            } else if link.target_id == primary_id {
                Some(link.source_id)
            } else {
                None
            };
            let Some(neighbor_id) = neighbor_id else { continue };
            if memory_ids.contains(&neighbor_id) {
                continue;
            }
            if let Ok(memory) = get_memory(db, user_id, neighbor_id) {
                if memory.is_obsolete {
                    continue;
                }
                out.push((primary_id, memory));
                count += 1;
            }
        }
    }
    Ok(out)
}

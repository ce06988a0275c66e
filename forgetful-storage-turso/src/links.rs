//! Memory-to-memory links: canonicalized `(source_id, target_id)` pairs,
//! unique per the table's `UNIQUE(source_id, target_id)` constraint.

use crate::memories::get_memory;
use crate::util::{internal, row_i64};
use forgetful_core::error::{Error, Result};
use forgetful_core::types::{Id, Memory, MemoryLink, UserId};
use libsql::{params, Connection};

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

pub(crate) async fn create_link(conn: &Connection, user_id: UserId, source_id: Id, target_id: Id) -> Result<MemoryLink> {
    let (canon_source, canon_target) = canonicalize(source_id, target_id)?;
    get_memory(conn, user_id, canon_source).await?;
    get_memory(conn, user_id, canon_target).await?;

    let mut existing = conn
        .query(
            "SELECT id FROM memory_links WHERE source_id = ?1 AND target_id = ?2",
            params![canon_source, canon_target],
        )
        .await
        .map_err(internal)?;
    if existing.next().await.map_err(internal)?.is_some() {
        return Err(Error::AlreadyLinked {
            source_id: canon_source,
            target_id: canon_target,
        });
    }

    let now = chrono::Utc::now();
    conn.execute(
        "INSERT INTO memory_links (user_id, source_id, target_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id.to_string(), canon_source, canon_target, now.to_rfc3339()],
    )
    .await
    .map_err(internal)?;

    Ok(MemoryLink {
        id: conn.last_insert_rowid(),
        user_id,
        source_id: canon_source,
        target_id: canon_target,
        created_at: now,
    })
}

pub(crate) async fn create_links_batch(
    conn: &Connection,
    user_id: UserId,
    source_id: Id,
    target_ids: &[Id],
) -> Result<Vec<MemoryLink>> {
    let mut created = Vec::new();
    for &target_id in target_ids {
        match create_link(conn, user_id, source_id, target_id).await {
            Ok(link) => created.push(link),
            Err(Error::AlreadyLinked { .. } | Error::Validation(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Ok(created)
}

pub(crate) async fn get_linked_memories(
    conn: &Connection,
    user_id: UserId,
    memory_ids: &[Id],
    max_links_per_primary: usize,
) -> Result<Vec<(Id, Memory)>> {
    let mut rows = conn
        .query(
            "SELECT source_id, target_id FROM memory_links WHERE user_id = ?1",
            params![user_id.to_string()],
        )
        .await
        .map_err(internal)?;
    let mut all_links = Vec::new();
    while let Some(row) = rows.next().await.map_err(internal)? {
        all_links.push((row_i64(&row, 0)?, row_i64(&row, 1)?));
    }

    let mut out = Vec::new();
    for &primary_id in memory_ids {
        let mut count = 0usize;
        for &(source_id, target_id) in &all_links {
            if count >= max_links_per_primary {
                break;
            }
            let neighbor_id = if source_id == primary_id {
                Some(target_id)
            } else if target_id == primary_id {
                Some(source_id)
            } else {
                None
            };
            let Some(neighbor_id) = neighbor_id else { continue };
            if memory_ids.contains(&neighbor_id) {
                continue;
            }
            if let Ok(memory) = get_memory(conn, user_id, neighbor_id).await {
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

//! Hash-chained, append-only block store.
//!
//! Each named chain starts with a genesis block written by [`ChainStore::create`].
//! Every later block commits to its predecessor through
//! `sha256(name || height || prev_hash || payload)`, so editing any stored block
//! breaks [`ChainStore::verify`]. Payloads are kept lz4-compressed.

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::info;

const GENESIS_PREV_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";
const GENESIS_PAYLOAD: &[u8] = b"genesis";

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain already exists: {0}")]
    AlreadyExists(String),
    #[error("chain not found: {0}")]
    NotFound(String),
    #[error("chain {name} corrupt at height {height}: {reason}")]
    Corrupt {
        name: String,
        height: i64,
        reason: String,
    },
    #[error("lz4 error: {0}")]
    Compression(String),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// A stored block with its payload decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: i64,
    pub prev_hash: String,
    pub hash: String,
    pub payload: Vec<u8>,
    pub created_at_ms: i64,
}

/// Handle to one named chain. Obtain it with `create` or `open`, never both.
#[derive(Debug, Clone)]
pub struct ChainStore {
    pool: SqlitePool,
    name: String,
    height: i64,
    tip_hash: String,
}

/// Block hash: hex SHA-256 over the chain name, height, previous hash and payload.
pub fn block_hash(name: &str, height: i64, prev_hash: &str, payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

impl ChainStore {
    /// Create a new chain with its genesis block.
    ///
    /// # Errors
    /// `AlreadyExists` if a chain with this name is already stored.
    pub async fn create(pool: SqlitePool, name: &str) -> Result<Self, ChainError> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query("SELECT name FROM chains WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(ChainError::AlreadyExists(name.to_string()));
        }

        let now = chrono::Utc::now().timestamp_millis();
        sqlx::query("INSERT INTO chains (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let hash = block_hash(name, 0, GENESIS_PREV_HASH, GENESIS_PAYLOAD);
        sqlx::query(
            r#"
            INSERT INTO blocks (chain_name, height, prev_hash, hash, payload, created_at)
            VALUES (?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(GENESIS_PREV_HASH)
        .bind(&hash)
        .bind(compress(GENESIS_PAYLOAD)?)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created chain {} (genesis {})", name, hash);

        Ok(Self {
            pool,
            name: name.to_string(),
            height: 0,
            tip_hash: hash,
        })
    }

    /// Open an existing chain at its current tip.
    ///
    /// # Errors
    /// `NotFound` if no chain with this name is stored.
    pub async fn open(pool: SqlitePool, name: &str) -> Result<Self, ChainError> {
        let tip = sqlx::query(
            r#"
            SELECT height, hash FROM blocks
            WHERE chain_name = ?
            ORDER BY height DESC
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| ChainError::NotFound(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            height: tip.get("height"),
            tip_hash: tip.get("hash"),
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Height of the newest block (genesis is 0).
    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn tip_hash(&self) -> &str {
        &self.tip_hash
    }

    /// Append `payload` as the next block and return it.
    pub async fn add_block(&mut self, payload: &[u8]) -> Result<Block, ChainError> {
        let height = self.height + 1;
        let hash = block_hash(&self.name, height, &self.tip_hash, payload);
        let created_at_ms = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO blocks (chain_name, height, prev_hash, hash, payload, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&self.name)
        .bind(height)
        .bind(&self.tip_hash)
        .bind(&hash)
        .bind(compress(payload)?)
        .bind(created_at_ms)
        .execute(&self.pool)
        .await?;

        let block = Block {
            height,
            prev_hash: std::mem::replace(&mut self.tip_hash, hash.clone()),
            hash,
            payload: payload.to_vec(),
            created_at_ms,
        };
        self.height = height;

        info!(
            "Appended block {} to chain {} ({} bytes)",
            block.height,
            self.name,
            payload.len()
        );
        Ok(block)
    }

    /// All blocks in height order, genesis first.
    pub async fn blocks(&self) -> Result<Vec<Block>, ChainError> {
        let rows = sqlx::query(
            r#"
            SELECT height, prev_hash, hash, payload, created_at
            FROM blocks
            WHERE chain_name = ?
            ORDER BY height ASC
            "#,
        )
        .bind(&self.name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let compressed: Vec<u8> = row.get("payload");
                Ok(Block {
                    height: row.get("height"),
                    prev_hash: row.get("prev_hash"),
                    hash: row.get("hash"),
                    payload: decompress(&compressed)?,
                    created_at_ms: row.get("created_at"),
                })
            })
            .collect()
    }

    /// Recompute every link and hash from genesis to tip.
    ///
    /// # Errors
    /// `Corrupt` naming the first block whose height, link or hash is wrong.
    pub async fn verify(&self) -> Result<(), ChainError> {
        let mut expected_prev = GENESIS_PREV_HASH.to_string();

        for (expected_height, block) in (0_i64..).zip(self.blocks().await?) {
            let corrupt = |reason: &str| ChainError::Corrupt {
                name: self.name.clone(),
                height: block.height,
                reason: reason.to_string(),
            };

            if block.height != expected_height {
                return Err(corrupt("height gap"));
            }
            if block.prev_hash != expected_prev {
                return Err(corrupt("previous hash mismatch"));
            }
            if block_hash(&self.name, block.height, &block.prev_hash, &block.payload) != block.hash {
                return Err(corrupt("hash mismatch"));
            }
            expected_prev = block.hash;
        }

        Ok(())
    }
}

fn compress(payload: &[u8]) -> Result<Vec<u8>, ChainError> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder
        .write_all(payload)
        .map_err(|e| ChainError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ChainError::Compression(e.to_string()))
}

fn decompress(compressed: &[u8]) -> Result<Vec<u8>, ChainError> {
    let mut decoder = lz4_flex::frame::FrameDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ChainError::Compression(e.to_string()))?;
    Ok(out)
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::domain::contract::{
    Contract, ContractChanges, ContractId, ContractSummary, NewContract, SkuMapping, SkuSelection,
};
use crate::domain::signature::{ContractRef, SignatureFilter, SignatureRecord};
use crate::domain::Shop;

use super::{ContractStore, DeleteOutcome, StoreError};

// ============================================================================
// Postgres Contract Store
// ============================================================================
//
// Tables: contracts, sku_mappings (FK ON DELETE CASCADE), signed_contracts
// (FK ON DELETE RESTRICT). See migrations/0001_contracts.sql.
//
// Every statement carries `shop = $n` for the contract it touches; mapping
// and signature rows are reached only through a shop-filtered contract.
//
// ============================================================================

pub struct PgContractStore {
    pool: PgPool,
}

impl PgContractStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unreachable = matches!(
            err,
            sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        );

        if unreachable {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::TransactionFailed(err.to_string())
        }
    }
}

// ============================================================================
// Row types
// ============================================================================

const CONTRACT_COLUMNS: &str = "id, shop, name, content, is_active, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ContractRow {
    id: i64,
    shop: String,
    name: String,
    content: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ContractListRow {
    #[sqlx(flatten)]
    contract: ContractRow,
    signature_count: i64,
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    id: i64,
    contract_id: i64,
    sku: String,
    product_id: String,
    variant_id: String,
}

#[derive(sqlx::FromRow)]
struct SignatureRow {
    id: i64,
    contract_id: i64,
    customer_name: Option<String>,
    customer_email: Option<String>,
    order_id: Option<String>,
    signed_at: DateTime<Utc>,
    contract_name: String,
}

impl ContractRow {
    fn into_contract(self, sku_mappings: Vec<SkuMapping>) -> Contract {
        Contract {
            id: self.id,
            shop: Shop::new(self.shop),
            name: self.name,
            content: self.content,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sku_mappings,
        }
    }
}

impl From<MappingRow> for SkuMapping {
    fn from(row: MappingRow) -> Self {
        SkuMapping {
            id: row.id,
            contract_id: row.contract_id,
            sku: row.sku,
            product_id: row.product_id,
            variant_id: row.variant_id,
        }
    }
}

impl From<SignatureRow> for SignatureRecord {
    fn from(row: SignatureRow) -> Self {
        SignatureRecord {
            id: row.id,
            contract_id: row.contract_id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            order_id: row.order_id,
            signed_at: row.signed_at,
            contract: ContractRef {
                id: row.contract_id,
                name: row.contract_name,
            },
        }
    }
}

// ============================================================================
// Statement helpers (run on a connection already inside a transaction)
// ============================================================================

async fn insert_mappings(
    conn: &mut PgConnection,
    contract_id: ContractId,
    selections: &[SkuSelection],
) -> Result<Vec<SkuMapping>, sqlx::Error> {
    let mut mappings = Vec::with_capacity(selections.len());

    for selection in selections {
        let row: MappingRow = sqlx::query_as(
            "INSERT INTO sku_mappings (contract_id, sku, product_id, variant_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, contract_id, sku, product_id, variant_id",
        )
        .bind(contract_id)
        .bind(&selection.sku)
        .bind(&selection.product_id)
        .bind(&selection.variant_id)
        .fetch_one(&mut *conn)
        .await?;

        mappings.push(row.into());
    }

    Ok(mappings)
}

async fn load_mappings(
    conn: &mut PgConnection,
    contract_id: ContractId,
) -> Result<Vec<SkuMapping>, sqlx::Error> {
    let rows: Vec<MappingRow> = sqlx::query_as(
        "SELECT id, contract_id, sku, product_id, variant_id
         FROM sku_mappings
         WHERE contract_id = $1
         ORDER BY id",
    )
    .bind(contract_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(SkuMapping::from).collect())
}

#[async_trait]
impl ContractStore for PgContractStore {
    async fn list_contracts(&self, shop: &Shop) -> Result<Vec<ContractSummary>, StoreError> {
        // Contracts and their mappings come from two statements; run both on
        // one snapshot so counts and mapping lists agree.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let contracts: Vec<ContractListRow> = sqlx::query_as(
            "SELECT c.id, c.shop, c.name, c.content, c.is_active, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM signed_contracts s WHERE s.contract_id = c.id)
                        AS signature_count
             FROM contracts c
             WHERE c.shop = $1
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(shop.as_str())
        .fetch_all(&mut *tx)
        .await?;

        let mapping_rows: Vec<MappingRow> = sqlx::query_as(
            "SELECT m.id, m.contract_id, m.sku, m.product_id, m.variant_id
             FROM sku_mappings m
             JOIN contracts c ON c.id = m.contract_id
             WHERE c.shop = $1
             ORDER BY m.id",
        )
        .bind(shop.as_str())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut by_contract: HashMap<ContractId, Vec<SkuMapping>> = HashMap::new();
        for row in mapping_rows {
            by_contract.entry(row.contract_id).or_default().push(row.into());
        }

        Ok(contracts
            .into_iter()
            .map(|row| {
                let mappings = by_contract.remove(&row.contract.id).unwrap_or_default();
                ContractSummary::new(row.contract.into_contract(mappings), row.signature_count)
            })
            .collect())
    }

    async fn find_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<Option<Contract>, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let row: Option<ContractRow> = sqlx::query_as(&format!(
            "SELECT {} FROM contracts WHERE id = $1 AND shop = $2",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .bind(shop.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mappings = load_mappings(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(row.into_contract(mappings)))
    }

    async fn insert_contract(
        &self,
        shop: &Shop,
        draft: &NewContract,
    ) -> Result<Contract, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: ContractRow = sqlx::query_as(&format!(
            "INSERT INTO contracts (shop, name, content, is_active)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            CONTRACT_COLUMNS
        ))
        .bind(shop.as_str())
        .bind(&draft.name)
        .bind(&draft.content)
        .bind(draft.is_active)
        .fetch_one(&mut *tx)
        .await?;

        let mappings = insert_mappings(&mut tx, row.id, &draft.mappings).await?;
        tx.commit().await?;

        tracing::info!(
            shop = %shop,
            contract_id = row.id,
            mapping_count = mappings.len(),
            "Inserted contract"
        );

        Ok(row.into_contract(mappings))
    }

    async fn replace_contract(
        &self,
        shop: &Shop,
        id: ContractId,
        changes: &ContractChanges,
    ) -> Result<Option<Contract>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The UPDATE takes the row lock, so concurrent replacements of the
        // same contract run one after the other until commit.
        let row: Option<ContractRow> = sqlx::query_as(&format!(
            "UPDATE contracts
             SET name = COALESCE($3, name),
                 content = COALESCE($4, content),
                 is_active = COALESCE($5, is_active),
                 updated_at = NOW()
             WHERE id = $1 AND shop = $2
             RETURNING {}",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .bind(shop.as_str())
        .bind(changes.name.as_deref())
        .bind(changes.content.as_deref())
        .bind(changes.is_active)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        let Some(row) = row else {
            return Ok(None);
        };

        let removed = sqlx::query("DELETE FROM sku_mappings WHERE contract_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mappings = insert_mappings(&mut tx, id, &changes.mappings).await?;
        tx.commit().await?;

        tracing::info!(
            shop = %shop,
            contract_id = id,
            removed = removed,
            inserted = mappings.len(),
            "Replaced contract mapping set"
        );

        Ok(Some(row.into_contract(mappings)))
    }

    async fn delete_contract(
        &self,
        shop: &Shop,
        id: ContractId,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM contracts WHERE id = $1 AND shop = $2 FOR UPDATE")
                .bind(id)
                .bind(shop.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let (signatures,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM signed_contracts WHERE contract_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if signatures > 0 {
            return Ok(DeleteOutcome::HasSignatures);
        }

        sqlx::query("DELETE FROM contracts WHERE id = $1 AND shop = $2")
            .bind(id)
            .bind(shop.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_signatures(
        &self,
        shop: &Shop,
        filter: &SignatureFilter,
    ) -> Result<Vec<SignatureRecord>, StoreError> {
        let rows: Vec<SignatureRow> = sqlx::query_as(
            "SELECT s.id, s.contract_id, s.customer_name, s.customer_email, s.order_id,
                    s.signed_at, c.name AS contract_name
             FROM signed_contracts s
             JOIN contracts c ON c.id = s.contract_id
             WHERE c.shop = $1
               AND ($2::BIGINT IS NULL OR s.contract_id = $2)
             ORDER BY s.signed_at DESC, s.id DESC",
        )
        .bind(shop.as_str())
        .bind(filter.contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SignatureRecord::from).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_map_to_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_statement_errors_map_to_transaction_failed() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::TransactionFailed(_)
        ));
    }

    #[test]
    fn test_signature_row_carries_contract_name() {
        let record = SignatureRecord::from(SignatureRow {
            id: 5,
            contract_id: 2,
            customer_name: Some("Ada".to_string()),
            customer_email: None,
            order_id: Some("#1001".to_string()),
            signed_at: Utc::now(),
            contract_name: "Waiver".to_string(),
        });

        assert_eq!(record.contract, ContractRef { id: 2, name: "Waiver".to_string() });
    }
}

// Statements above need a live Postgres for end-to-end checks; the repository
// behaviour they implement is exercised against MemoryContractStore.

//! Positional row scanning shared by both database sources.

use sqlx::{ColumnIndex, Decode, Row, Type};
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use productcatalog_products::{Catalog, ProductRow};

use crate::error::CatalogLoadError;

/// Columns in the order `scan_product_row` reads them.
pub const PRODUCT_COLUMNS: &str = "id, name, description, picture, price_usd_currency_code, price_usd_units, price_usd_nanos, categories";

pub fn select_products(table: &str) -> String {
    format!("SELECT {PRODUCT_COLUMNS} FROM {table}")
}

/// Read one catalog row by position.
///
/// Integer columns accept either width, as schemas differ between the two
/// servers (`INTEGER` vs `BIGINT`).
pub fn scan_product_row<'r, R>(row: &'r R) -> Result<ProductRow, sqlx::Error>
where
    R: Row,
    usize: ColumnIndex<R>,
    String: Decode<'r, R::Database> + Type<R::Database>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
{
    Ok(ProductRow {
        id: row.try_get(0)?,
        name: row.try_get(1)?,
        description: row.try_get(2)?,
        picture: row.try_get(3)?,
        currency_code: row.try_get(4)?,
        units: wide_int(row, 5)?,
        nanos: narrow_int(row, 6)?,
        categories: row.try_get(7)?,
    })
}

fn wide_int<'r, R>(row: &'r R, index: usize) -> Result<i64, sqlx::Error>
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<i64, _>(index)
        .or_else(|err| row.try_get::<i32, _>(index).map(i64::from).map_err(|_| err))
}

fn narrow_int<'r, R>(row: &'r R, index: usize) -> Result<i32, sqlx::Error>
where
    R: Row,
    usize: ColumnIndex<R>,
    i64: Decode<'r, R::Database> + Type<R::Database>,
    i32: Decode<'r, R::Database> + Type<R::Database>,
{
    match row.try_get::<i32, _>(index) {
        Ok(value) => Ok(value),
        Err(err) => {
            let wide = row.try_get::<i64, _>(index).map_err(|_| err)?;
            narrow_from_wide(index, wide)
        }
    }
}

fn narrow_from_wide(index: usize, wide: i64) -> Result<i32, sqlx::Error> {
    i32::try_from(wide).map_err(|source| sqlx::Error::ColumnDecode {
        index: index.to_string(),
        source: Box::new(source),
    })
}

/// Drain a row stream into a fresh catalog, in stream order.
///
/// An error before the first row is a query failure, one after it an
/// iteration failure, and a row that `scan` rejects a scan failure carrying
/// its 0-based index. Nothing partial is returned on any of them.
pub async fn collect_products<S, R, F>(mut rows: S, mut scan: F) -> Result<Catalog, CatalogLoadError>
where
    S: Stream<Item = Result<R, sqlx::Error>> + Unpin,
    F: FnMut(R) -> Result<ProductRow, sqlx::Error>,
{
    let mut products = Vec::new();

    while let Some(next) = rows.next().await {
        let row = match next {
            Ok(row) => row,
            Err(err) if products.is_empty() => {
                warn!(error = %err, "failed to query database");
                return Err(CatalogLoadError::Query(err));
            }
            Err(err) => {
                warn!(rows = products.len(), error = %err, "error iterating over rows");
                return Err(CatalogLoadError::RowIteration {
                    rows: products.len(),
                    source: err,
                });
            }
        };

        let index = products.len();
        let scanned = scan(row).map_err(|source| {
            warn!(row = index, error = %source, "failed to scan query result row");
            CatalogLoadError::Scan { row: index, source }
        })?;
        products.push(scanned.into_product());
    }

    Ok(Catalog::new(products))
}

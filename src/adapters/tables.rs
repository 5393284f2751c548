//! CSV loaders for the product mapping (de-para) and price lookup tables.

use serde::Deserialize;
use std::path::Path;

use crate::domain::model::{PriceEntry, PriceMap, ProductCodes, ProductMap};
use crate::utils::error::Result;

#[derive(Debug, Deserialize)]
struct MappingRow {
    produto: String,
    produto_retorno: String,
    produto_industrial: String,
    material_codigo: String,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    produto: String,
    retorno: f64,
    industrial: f64,
    material: f64,
}

pub fn load_product_map<P: AsRef<Path>>(path: P) -> Result<ProductMap> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut map = ProductMap::new();

    for row in reader.deserialize() {
        let row: MappingRow = row?;
        map.insert(
            row.produto,
            ProductCodes {
                return_code: row.produto_retorno,
                industrial_code: row.produto_industrial,
                material_code: row.material_codigo,
            },
        );
    }

    Ok(map)
}

pub fn load_price_map<P: AsRef<Path>>(path: P) -> Result<PriceMap> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut map = PriceMap::new();

    for row in reader.deserialize() {
        let row: PriceRow = row?;
        map.insert(
            row.produto,
            PriceEntry {
                return_value: row.retorno,
                industrial_value: row.industrial,
                material_value: row.material,
            },
        );
    }

    Ok(map)
}

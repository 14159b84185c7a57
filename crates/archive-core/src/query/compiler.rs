//! Translation of a [`Query`] into parameterized SQL.
//!
//! Every filter becomes an `EXISTS` sub-select on the outer `entry e` row, so
//! an entry is returned at most once however many filters it matches. The
//! latest-only restriction is evaluated over all snapshots of an identifier
//! before any filter applies.

use super::types::{Filter, Operator, Query, SubjectType};
use crate::error::{ArchiveError, Result};
use crate::registry::{PropertyType, PropertyTypeRegistry};
use rusqlite::types::Value;

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

const SELECT_COLUMNS: &str = "SELECT e.identifier, e.hash, e.date FROM entry e";
const ORDER_BY: &str = " ORDER BY e.identifier, e.date, e.hash";

const LATEST_ONLY: &str = "NOT EXISTS (SELECT 1 FROM entry newer \
     WHERE newer.identifier = e.identifier \
     AND (newer.date > e.date OR (newer.date = e.date AND newer.hash > e.hash)))";

/// Validate pagination and return the row offset.
pub fn page_offset(page: i64, page_size: i64) -> Result<i64> {
    if page < 0 {
        return Err(ArchiveError::Validation {
            field: "page".to_string(),
            message: format!("must not be negative, got {}", page),
        });
    }
    if page_size < 0 {
        return Err(ArchiveError::Validation {
            field: "page_size".to_string(),
            message: format!("must not be negative, got {}", page_size),
        });
    }
    page.checked_mul(page_size).ok_or_else(|| ArchiveError::Validation {
        field: "page".to_string(),
        message: format!("offset of page {} with size {} overflows", page, page_size),
    })
}

/// One page of matches in identifier, date, hash order.
pub fn compile_page(
    query: &Query,
    registry: &PropertyTypeRegistry,
    page: i64,
    page_size: i64,
) -> Result<CompiledQuery> {
    let offset = page_offset(page, page_size)?;
    let (conditions, mut params) = where_clause(query, registry)?;

    params.push(Value::Integer(page_size));
    params.push(Value::Integer(offset));

    Ok(CompiledQuery {
        sql: format!("{}{}{} LIMIT ? OFFSET ?", SELECT_COLUMNS, conditions, ORDER_BY),
        params,
    })
}

/// Every match, ordered like [`compile_page`].
pub fn compile_all(query: &Query, registry: &PropertyTypeRegistry) -> Result<CompiledQuery> {
    let (conditions, params) = where_clause(query, registry)?;
    Ok(CompiledQuery {
        sql: format!("{}{}{}", SELECT_COLUMNS, conditions, ORDER_BY),
        params,
    })
}

/// Number of matches.
pub fn compile_count(query: &Query, registry: &PropertyTypeRegistry) -> Result<CompiledQuery> {
    let (conditions, params) = where_clause(query, registry)?;
    Ok(CompiledQuery {
        sql: format!("SELECT COUNT(*) FROM entry e{}", conditions),
        params,
    })
}

fn where_clause(query: &Query, registry: &PropertyTypeRegistry) -> Result<(String, Vec<Value>)> {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    if query.latest {
        conditions.push(LATEST_ONLY.to_string());
    }

    for filter in &query.filters {
        let condition = match filter.subject_type {
            SubjectType::Software => software_condition(filter, &mut params)?,
            SubjectType::Property => property_condition(filter, registry, &mut params)?,
        };
        conditions.push(condition);
    }

    if conditions.is_empty() {
        Ok((String::new(), params))
    } else {
        Ok((format!(" WHERE {}", conditions.join(" AND ")), params))
    }
}

fn software_condition(filter: &Filter, params: &mut Vec<Value>) -> Result<String> {
    if filter.operator != Operator::Eq {
        return Err(ArchiveError::invalid_filter(format!(
            "Software filters only support '=', got '{}'",
            filter.operator
        )));
    }

    let mut sql = String::from(
        "EXISTS (SELECT 1 FROM entry_software es JOIN software s ON s.id = es.software_id \
         WHERE es.entry_id = e.id AND s.name = ?",
    );
    params.push(Value::Text(filter.subject_name.clone()));

    if !filter.value.is_empty() {
        sql.push_str(" AND s.version = ?");
        params.push(Value::Text(filter.value.clone()));
    }
    sql.push(')');
    Ok(sql)
}

fn property_condition(
    filter: &Filter,
    registry: &PropertyTypeRegistry,
    params: &mut Vec<Value>,
) -> Result<String> {
    let ty = registry.type_of(&filter.subject_name)?;

    if ty == PropertyType::Boolean && !matches!(filter.operator, Operator::Eq | Operator::Ne) {
        return Err(ArchiveError::invalid_filter(format!(
            "Boolean property {} only supports '=' and '!=', got '{}'",
            filter.subject_name, filter.operator
        )));
    }

    let literal = parse_literal(ty, &filter.value).ok_or_else(|| {
        ArchiveError::invalid_filter(format!(
            "{:?} is not a valid {} for {}",
            filter.value, ty, filter.subject_name
        ))
    })?;

    params.push(Value::Text(filter.subject_name.clone()));
    params.push(literal);

    Ok(format!(
        "EXISTS (SELECT 1 FROM {} v JOIN property p ON p.id = v.property_id \
         WHERE v.entry_id = e.id AND p.name = ? AND v.value {} ?)",
        ty.value_table(),
        filter.operator.symbol()
    ))
}

/// Parse a filter literal by the property's declared type.
fn parse_literal(ty: PropertyType, text: &str) -> Option<Value> {
    match ty {
        PropertyType::String => Some(Value::Text(text.to_string())),
        PropertyType::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::Real),
        PropertyType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(Value::Integer(1)),
            "false" | "0" => Some(Value::Integer(0)),
            _ => None,
        },
    }
}

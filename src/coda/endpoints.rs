//! Request builders for every Coda endpoint the tools use.
//!
//! Identifiers are percent-encoded as single path segments, since Coda
//! accepts page, table and column *names* as well as ids.

use serde_json::{json, Value};

use super::models::{ApiRequest, ExportFormat};
use crate::pagination::ResolvedListParams;

fn seg(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn doc_path(doc_id: &str) -> String {
    format!("/docs/{}", seg(doc_id))
}

fn page_path(doc_id: &str, page: &str) -> String {
    format!("{}/pages/{}", doc_path(doc_id), seg(page))
}

fn table_path(doc_id: &str, table: &str) -> String {
    format!("{}/tables/{}", doc_path(doc_id), seg(table))
}

fn row_path(doc_id: &str, table: &str, row: &str) -> String {
    format!("{}/rows/{}", table_path(doc_id, table), seg(row))
}

fn with_list(request: ApiRequest, list: &ResolvedListParams) -> ApiRequest {
    request
        .query_opt("limit", list.limit)
        .query_opt("pageToken", list.page_token.as_deref())
}

// ============================================================================
// Account
// ============================================================================

pub fn whoami() -> ApiRequest {
    ApiRequest::get("/whoami")
}

pub fn resolve_browser_link(url: &str) -> ApiRequest {
    ApiRequest::get("/resolveBrowserLink").query("url", url)
}

// ============================================================================
// Docs
// ============================================================================

pub fn list_docs(query: Option<&str>, list: &ResolvedListParams) -> ApiRequest {
    with_list(ApiRequest::get("/docs").query_opt("query", query), list)
}

pub fn get_doc(doc_id: &str) -> ApiRequest {
    ApiRequest::get(doc_path(doc_id))
}

pub fn create_doc(body: Value) -> ApiRequest {
    ApiRequest::post("/docs").json(body)
}

pub fn update_doc(doc_id: &str, body: Value) -> ApiRequest {
    ApiRequest::patch(doc_path(doc_id)).json(body)
}

pub fn delete_doc(doc_id: &str) -> ApiRequest {
    ApiRequest::delete(doc_path(doc_id))
}

// ============================================================================
// Pages
// ============================================================================

pub fn list_pages(doc_id: &str, list: &ResolvedListParams) -> ApiRequest {
    with_list(ApiRequest::get(format!("{}/pages", doc_path(doc_id))), list)
}

pub fn get_page(doc_id: &str, page: &str) -> ApiRequest {
    ApiRequest::get(page_path(doc_id, page))
}

pub fn create_page(doc_id: &str, body: Value) -> ApiRequest {
    ApiRequest::post(format!("{}/pages", doc_path(doc_id))).json(body)
}

pub fn update_page(doc_id: &str, page: &str, body: Value) -> ApiRequest {
    ApiRequest::put(page_path(doc_id, page)).json(body)
}

pub fn delete_page(doc_id: &str, page: &str) -> ApiRequest {
    ApiRequest::delete(page_path(doc_id, page))
}

pub fn begin_page_export(doc_id: &str, page: &str, format: ExportFormat) -> ApiRequest {
    ApiRequest::post(format!("{}/export", page_path(doc_id, page)))
        .json(json!({ "outputFormat": format.as_str() }))
}

pub fn page_export_status(doc_id: &str, page: &str, export_id: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/export/{}", page_path(doc_id, page), seg(export_id)))
}

// ============================================================================
// Tables and columns
// ============================================================================

pub fn list_tables(doc_id: &str, list: &ResolvedListParams) -> ApiRequest {
    with_list(ApiRequest::get(format!("{}/tables", doc_path(doc_id))), list)
}

pub fn get_table(doc_id: &str, table: &str) -> ApiRequest {
    ApiRequest::get(table_path(doc_id, table))
}

pub fn list_columns(doc_id: &str, table: &str, list: &ResolvedListParams) -> ApiRequest {
    with_list(
        ApiRequest::get(format!("{}/columns", table_path(doc_id, table))),
        list,
    )
}

pub fn get_column(doc_id: &str, table: &str, column: &str) -> ApiRequest {
    ApiRequest::get(format!(
        "{}/columns/{}",
        table_path(doc_id, table),
        seg(column)
    ))
}

// ============================================================================
// Rows
// ============================================================================

/// Filters accepted by the row listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct RowQuery<'a> {
    pub query: Option<&'a str>,
    pub sort_by: Option<&'a str>,
    pub use_column_names: Option<bool>,
    pub value_format: Option<&'a str>,
    pub visible_only: Option<bool>,
}

pub fn list_rows(
    doc_id: &str,
    table: &str,
    filter: &RowQuery<'_>,
    list: &ResolvedListParams,
) -> ApiRequest {
    let request = ApiRequest::get(format!("{}/rows", table_path(doc_id, table)))
        .query_opt("query", filter.query)
        .query_opt("sortBy", filter.sort_by)
        .query_opt("useColumnNames", filter.use_column_names)
        .query_opt("valueFormat", filter.value_format)
        .query_opt("visibleOnly", filter.visible_only);
    with_list(request, list)
}

pub fn get_row(doc_id: &str, table: &str, row: &str, use_column_names: Option<bool>) -> ApiRequest {
    ApiRequest::get(row_path(doc_id, table, row)).query_opt("useColumnNames", use_column_names)
}

pub fn upsert_rows(doc_id: &str, table: &str, body: Value) -> ApiRequest {
    ApiRequest::post(format!("{}/rows", table_path(doc_id, table))).json(body)
}

pub fn update_row(doc_id: &str, table: &str, row: &str, cells: Value) -> ApiRequest {
    ApiRequest::put(row_path(doc_id, table, row)).json(json!({ "row": { "cells": cells } }))
}

pub fn delete_row(doc_id: &str, table: &str, row: &str) -> ApiRequest {
    ApiRequest::delete(row_path(doc_id, table, row))
}

pub fn push_button(doc_id: &str, table: &str, row: &str, column: &str) -> ApiRequest {
    ApiRequest::post(format!(
        "{}/buttons/{}",
        row_path(doc_id, table, row),
        seg(column)
    ))
}

// ============================================================================
// Formulas and controls
// ============================================================================

pub fn list_formulas(doc_id: &str, list: &ResolvedListParams) -> ApiRequest {
    with_list(ApiRequest::get(format!("{}/formulas", doc_path(doc_id))), list)
}

pub fn get_formula(doc_id: &str, formula: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/formulas/{}", doc_path(doc_id), seg(formula)))
}

pub fn list_controls(doc_id: &str, list: &ResolvedListParams) -> ApiRequest {
    with_list(ApiRequest::get(format!("{}/controls", doc_path(doc_id))), list)
}

pub fn get_control(doc_id: &str, control: &str) -> ApiRequest {
    ApiRequest::get(format!("{}/controls/{}", doc_path(doc_id), seg(control)))
}

//! Filter compilation pipeline

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use super::error::FilterError;
use super::include::compile_includes;
use super::order::compile_order;
use super::parser::parse_filter;
use super::projection::compile_fields;
use super::types::{Filter, QueryOptions};
use super::update::{UpdateCompileResult, compile_update};
use super::where_clause::compile_where;
use crate::core::CompilerConfig;
use crate::schema::{Catalog, ColumnResolver, HiddenProperties, RelationConfig, TableSchema};
use crate::sql::{PostgresDialect, SqlDialect, SqlParams, render_select};

/// Compiles filters and update payloads against a catalog of table schemas
pub struct FilterCompiler<'a> {
    catalog: &'a Catalog,
    hidden: Option<&'a dyn HiddenProperties>,
    resolver: Arc<ColumnResolver>,
    dialect: &'a dyn SqlDialect,
    config: CompilerConfig,
}

impl<'a> FilterCompiler<'a> {
    /// Compiler over `catalog` using the process-wide column cache and PostgreSQL
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            hidden: None,
            resolver: ColumnResolver::shared(),
            dialect: &PostgresDialect,
            config: CompilerConfig::default(),
        }
    }

    pub fn with_hidden_properties(mut self, hidden: &'a dyn HiddenProperties) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<ColumnResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_dialect(mut self, dialect: &'a dyn SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        self.catalog
    }

    pub(crate) fn resolver(&self) -> &ColumnResolver {
        &self.resolver
    }

    pub(crate) fn hidden_properties(&self, relation: &RelationConfig) -> Option<&[String]> {
        self.hidden.and_then(|h| h.hidden_properties(relation))
    }

    /// Compile a filter into backend-agnostic query options
    pub fn compile(&self, schema: &TableSchema, filter: &Filter) -> Result<QueryOptions, FilterError> {
        let options = self.compile_at_depth(schema, filter, 0)?;
        tracing::debug!(
            table = %schema.name,
            has_where = options.where_clause.is_some(),
            relations = options.with.as_ref().map_or(0, |w| w.len()),
            "Compiled filter"
        );
        Ok(options)
    }

    /// Parse JSON filter text, then compile it
    pub fn compile_json(&self, schema: &TableSchema, json: &str) -> Result<QueryOptions, FilterError> {
        let filter = parse_filter(json, &self.config)?;
        self.compile(schema, &filter)
    }

    pub(crate) fn compile_at_depth(
        &self,
        schema: &TableSchema,
        filter: &Filter,
        depth: usize,
    ) -> Result<QueryOptions, FilterError> {
        let columns = self.resolver.resolve(schema)?;

        let where_clause = match &filter.where_clause {
            Some(clause) => compile_where(&columns, clause)?,
            None => None,
        };

        let order_by = match filter.order.as_deref() {
            Some(order) => Some(compile_order(&columns, order)?).filter(|o| !o.is_empty()),
            None => None,
        };

        let projection = filter
            .fields
            .as_ref()
            .map(|fields| compile_fields(&schema.name, fields))
            .transpose()?;

        let with = match filter.include.as_deref() {
            Some(includes) if !includes.is_empty() => {
                Some(compile_includes(self, schema, includes, depth)?)
            }
            _ => None,
        };

        Ok(QueryOptions {
            limit: filter.limit,
            offset: filter.effective_offset(),
            order_by,
            where_clause,
            with,
            columns: projection,
        })
    }

    /// Compile an update payload into flat assignments and JSON merge expressions
    pub fn compile_update(
        &self,
        schema: &TableSchema,
        payload: &Map<String, JsonValue>,
    ) -> Result<UpdateCompileResult, FilterError> {
        let columns = self.resolver.resolve(schema)?;
        let result = compile_update(&columns, payload, self.dialect)?;
        tracing::debug!(
            table = %schema.name,
            dialect = self.dialect.name(),
            flat = result.flat_fields.len(),
            merged = result.merge_expressions_by_column.len(),
            "Compiled update"
        );
        Ok(result)
    }

    /// Render compiled options as a parameterized `SELECT`
    pub fn render_select(
        &self,
        schema: &TableSchema,
        options: &QueryOptions,
    ) -> Result<(String, SqlParams), FilterError> {
        let columns = self.resolver.resolve(schema)?;
        render_select(&columns, options, self.dialect)
    }

    /// Render a `SET` clause for a compiled update
    pub fn render_set_clause(&self, update: &UpdateCompileResult) -> (String, SqlParams) {
        let mut params = SqlParams::new();
        let clause = update.to_set_clause(&mut params, self.dialect);
        (clause, params)
    }
}

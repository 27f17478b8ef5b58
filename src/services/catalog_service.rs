//! CatalogService — the service-provider catalog backed by SQLite.
//!
//! Listing supports a small query language translated from URL parameters:
//! `field=value` for equality and `field[op]=value` for comparisons, where
//! `op` is one of `gt`, `gte`, `lt`, `lte`, `in`. Parameters are parsed into
//! a typed filter tree validated against a field allow-list before any SQL
//! is built, so no request-supplied string ever reaches the query text.

use crate::{
    errors::{ApiError, ApiResult},
    models::provider::Provider,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u32 = 25;
const MAX_PAGE_LIMIT: u32 = 100;
const POSTALCODE_LEN: usize = 5;

/// Fields a list request may filter on.
const FILTERABLE_FIELDS: [&str; 7] = [
    "name",
    "address",
    "district",
    "province",
    "postalcode",
    "tel",
    "region",
];

/// Fields a list request may sort on.
const SORTABLE_FIELDS: [&str; 8] = [
    "name",
    "address",
    "district",
    "province",
    "postalcode",
    "tel",
    "region",
    "created_at",
];

/// Query-parameter names that are not filters.
const RESERVED_PARAMS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Comparison operator accepted in `field[op]=value` parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    const fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            // IN is rendered separately with a bind list.
            FilterOp::In => "IN",
        }
    }
}

/// One node of the parsed filter tree. The field is a `&'static str` taken
/// from the allow-list, never the raw request string.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    pub field: &'static str,
    pub op: FilterOp,
    pub value: String,
}

/// One sort key, `-field` in the query string meaning descending.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static str,
    pub descending: bool,
}

/// Fully parsed list request.
#[derive(Clone, Debug)]
pub struct ListProvidersParams {
    pub filters: Vec<FieldFilter>,
    pub sort: Vec<SortKey>,
    pub page: u32,
    pub limit: u32,
}

/// Page descriptor echoed back in the pagination envelope.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRef {
    pub page: u32,
    pub limit: u32,
}

/// `next`/`prev` descriptors, present only when more pages exist in that
/// direction.
#[derive(Serialize, Debug, Default)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageRef>,
}

/// One page of providers plus its pagination descriptors.
#[derive(Debug)]
pub struct ProviderPage {
    pub providers: Vec<Provider>,
    pub pagination: Pagination,
}

/// Fields accepted when creating a provider. Defaults let missing body
/// fields fall through to validation instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewProvider {
    pub name: String,
    pub address: String,
    pub district: String,
    pub province: String,
    pub postalcode: String,
    pub tel: String,
    pub region: String,
}

/// Partial provider update.
#[derive(Debug, Deserialize)]
pub struct ProviderUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub postalcode: Option<String>,
    pub tel: Option<String>,
    pub region: Option<String>,
}

/// Parse raw query parameters into typed list params.
///
/// Unknown fields and operators are validation errors; the `select`
/// parameter is accepted for compatibility and ignored.
pub fn parse_list_params(query: &HashMap<String, String>) -> ApiResult<ListProvidersParams> {
    let mut filters = Vec::new();
    for (key, value) in query {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        filters.push(parse_filter(key, value)?);
    }

    let sort = match query.get("sort") {
        Some(spec) => parse_sort(spec)?,
        None => vec![SortKey {
            field: "created_at",
            descending: true,
        }],
    };

    let page = match query.get("page") {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ApiError::Validation(format!("invalid page `{}`", raw)))?,
        None => 1,
    };
    let limit = match query.get("limit") {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| ApiError::Validation(format!("invalid limit `{}`", raw)))?
            .min(MAX_PAGE_LIMIT),
        None => DEFAULT_PAGE_LIMIT,
    };

    Ok(ListProvidersParams {
        filters,
        sort,
        page,
        limit,
    })
}

fn parse_filter(key: &str, value: &str) -> ApiResult<FieldFilter> {
    let (field, op) = match key.split_once('[') {
        Some((field, rest)) => {
            let op_name = rest.strip_suffix(']').ok_or_else(|| {
                ApiError::Validation(format!("malformed filter parameter `{}`", key))
            })?;
            let op = match op_name {
                "gt" => FilterOp::Gt,
                "gte" => FilterOp::Gte,
                "lt" => FilterOp::Lt,
                "lte" => FilterOp::Lte,
                "in" => FilterOp::In,
                other => {
                    return Err(ApiError::Validation(format!(
                        "unsupported filter operator `{}`",
                        other
                    )));
                }
            };
            (field, op)
        }
        None => (key, FilterOp::Eq),
    };

    let field = allowed_field(&FILTERABLE_FIELDS, field, "filter")?;
    Ok(FieldFilter {
        field,
        op,
        value: value.to_string(),
    })
}

fn parse_sort(spec: &str) -> ApiResult<Vec<SortKey>> {
    let mut keys = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, descending) = match part.strip_prefix('-') {
            Some(name) => (name, true),
            None => (part, false),
        };
        keys.push(SortKey {
            field: allowed_field(&SORTABLE_FIELDS, name, "sort")?,
            descending,
        });
    }
    if keys.is_empty() {
        return Err(ApiError::Validation("empty sort specification".into()));
    }
    Ok(keys)
}

/// Resolve a request-supplied field name to its allow-listed static str.
fn allowed_field(
    allowed: &[&'static str],
    field: &str,
    context: &str,
) -> ApiResult<&'static str> {
    allowed
        .iter()
        .copied()
        .find(|candidate| *candidate == field)
        .ok_or_else(|| ApiError::Validation(format!("cannot {} on field `{}`", context, field)))
}

/// Provider catalog store.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<SqlitePool>,
}

impl CatalogService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// List providers with filters, sorting, and skip/limit pagination.
    ///
    /// `next`/`prev` descriptors are only present when more pages exist in
    /// that direction, judged against the filtered total.
    pub async fn list(&self, params: &ListProvidersParams) -> ApiResult<ProviderPage> {
        let mut count_builder =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM providers WHERE 1=1");
        push_filters(&mut count_builder, &params.filters);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&*self.db)
            .await?;

        let skip = i64::from(params.page - 1) * i64::from(params.limit);

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, name, address, district, province, postalcode, tel, region, created_at \
             FROM providers WHERE 1=1",
        );
        push_filters(&mut builder, &params.filters);

        builder.push(" ORDER BY ");
        for (i, key) in params.sort.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            // Field names come from the allow-list, safe to interpolate.
            builder.push(key.field);
            builder.push(if key.descending { " DESC" } else { " ASC" });
        }

        builder.push(" LIMIT ");
        builder.push_bind(i64::from(params.limit));
        builder.push(" OFFSET ");
        builder.push_bind(skip);

        let providers: Vec<Provider> = builder.build_query_as().fetch_all(&*self.db).await?;

        let mut pagination = Pagination::default();
        if skip + i64::from(params.limit) < total {
            pagination.next = Some(PageRef {
                page: params.page + 1,
                limit: params.limit,
            });
        }
        if skip > 0 {
            pagination.prev = Some(PageRef {
                page: params.page - 1,
                limit: params.limit,
            });
        }

        Ok(ProviderPage {
            providers,
            pagination,
        })
    }

    /// Fetch a single provider by id.
    pub async fn get(&self, id: Uuid) -> ApiResult<Provider> {
        sqlx::query_as::<_, Provider>(
            "SELECT id, name, address, district, province, postalcode, tel, region, created_at
             FROM providers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Provider not found with id of {}", id)))
    }

    /// Create a provider record.
    pub async fn create(&self, fields: NewProvider) -> ApiResult<Provider> {
        ensure_required(&fields.name, "name")?;
        ensure_required(&fields.address, "address")?;
        ensure_required(&fields.district, "district")?;
        ensure_required(&fields.province, "province")?;
        ensure_required(&fields.region, "region")?;
        ensure_required(&fields.tel, "tel")?;
        ensure_postalcode(&fields.postalcode)?;

        let provider = Provider {
            id: Uuid::new_v4(),
            name: fields.name,
            address: fields.address,
            district: fields.district,
            province: fields.province,
            postalcode: fields.postalcode,
            tel: fields.tel,
            region: fields.region,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO providers (id, name, address, district, province, postalcode, tel, region, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(provider.id)
        .bind(&provider.name)
        .bind(&provider.address)
        .bind(&provider.district)
        .bind(&provider.province)
        .bind(&provider.postalcode)
        .bind(&provider.tel)
        .bind(&provider.region)
        .bind(provider.created_at)
        .execute(&*self.db)
        .await?;

        Ok(provider)
    }

    /// Partial update of a provider.
    pub async fn update(&self, id: Uuid, update: ProviderUpdate) -> ApiResult<Provider> {
        if let Some(postalcode) = &update.postalcode {
            ensure_postalcode(postalcode)?;
        }

        sqlx::query_as::<_, Provider>(
            "UPDATE providers SET
                 name = COALESCE(?, name),
                 address = COALESCE(?, address),
                 district = COALESCE(?, district),
                 province = COALESCE(?, province),
                 postalcode = COALESCE(?, postalcode),
                 tel = COALESCE(?, tel),
                 region = COALESCE(?, region)
             WHERE id = ?
             RETURNING id, name, address, district, province, postalcode, tel, region, created_at",
        )
        .bind(update.name)
        .bind(update.address)
        .bind(update.district)
        .bind(update.province)
        .bind(update.postalcode)
        .bind(update.tel)
        .bind(update.region)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Provider not found with id of {}", id)))
    }

    /// Delete a provider and every booking referencing it.
    ///
    /// Bookings are removed first (hard delete, not soft), then the
    /// provider row itself.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.get(id).await?;

        sqlx::query("DELETE FROM bookings WHERE provider_id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        sqlx::query("DELETE FROM providers WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(())
    }
}

/// Append `AND field op value` clauses for each parsed filter.
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filters: &[FieldFilter]) {
    for filter in filters {
        builder.push(" AND ");
        builder.push(filter.field);
        if filter.op == FilterOp::In {
            builder.push(" IN (");
            let mut separated = builder.separated(", ");
            for value in filter.value.split(',').map(str::trim) {
                separated.push_bind(value.to_string());
            }
            builder.push(")");
        } else {
            builder.push(" ");
            builder.push(filter.op.sql());
            builder.push(" ");
            builder.push_bind(filter.value.clone());
        }
    }
}

fn ensure_required(value: &str, field: &'static str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::Validation(format!("Please add a {}", field)))
    } else {
        Ok(())
    }
}

fn ensure_postalcode(postalcode: &str) -> ApiResult<()> {
    if postalcode.len() == POSTALCODE_LEN && postalcode.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Postal code must be exactly 5 digits".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_service() -> CatalogService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        CatalogService::new(Arc::new(pool))
    }

    fn provider_fields(name: &str, province: &str, postalcode: &str) -> NewProvider {
        NewProvider {
            name: name.into(),
            address: "121 Sukhumvit Rd".into(),
            district: "Bang Na".into(),
            province: province.into(),
            postalcode: postalcode.into(),
            tel: "02-2187000".into(),
            region: "Bangkok".into(),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_equality_and_comparison_filters() {
        let params =
            parse_list_params(&query(&[("province", "Bangkok"), ("postalcode[gte]", "10000")]))
                .unwrap();

        assert_eq!(params.filters.len(), 2);
        let eq = params.filters.iter().find(|f| f.field == "province").unwrap();
        assert_eq!(eq.op, FilterOp::Eq);
        assert_eq!(eq.value, "Bangkok");
        let gte = params
            .filters
            .iter()
            .find(|f| f.field == "postalcode")
            .unwrap();
        assert_eq!(gte.op, FilterOp::Gte);
    }

    #[test]
    fn parses_in_filter_and_sort_spec() {
        let params = parse_list_params(&query(&[
            ("region[in]", "Bangkok,Chiang Mai"),
            ("sort", "province,-created_at"),
        ]))
        .unwrap();

        assert_eq!(params.filters[0].op, FilterOp::In);
        assert_eq!(
            params.sort,
            vec![
                SortKey {
                    field: "province",
                    descending: false
                },
                SortKey {
                    field: "created_at",
                    descending: true
                },
            ]
        );
    }

    #[test]
    fn defaults_apply_when_params_absent() {
        let params = parse_list_params(&query(&[])).unwrap();
        assert!(params.filters.is_empty());
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(
            params.sort,
            vec![SortKey {
                field: "created_at",
                descending: true
            }]
        );
    }

    #[test]
    fn rejects_unknown_fields_and_operators() {
        assert!(matches!(
            parse_list_params(&query(&[("password_hash", "x")])),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            parse_list_params(&query(&[("province[regex]", "x")])),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            parse_list_params(&query(&[("sort", "id")])),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            parse_list_params(&query(&[("page", "zero")])),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn select_param_is_ignored() {
        let params = parse_list_params(&query(&[("select", "name,province")])).unwrap();
        assert!(params.filters.is_empty());
    }

    #[tokio::test]
    async fn pagination_descriptors_only_when_more_pages_exist() {
        let service = test_service().await;
        for i in 0..30 {
            service
                .create(provider_fields(&format!("Provider {}", i), "Bangkok", "10110"))
                .await
                .unwrap();
        }

        let page1 = service
            .list(&parse_list_params(&query(&[])).unwrap())
            .await
            .unwrap();
        assert_eq!(page1.providers.len(), 25);
        assert_eq!(page1.pagination.next, Some(PageRef { page: 2, limit: 25 }));
        assert_eq!(page1.pagination.prev, None);

        let page2 = service
            .list(&parse_list_params(&query(&[("page", "2")])).unwrap())
            .await
            .unwrap();
        assert_eq!(page2.providers.len(), 5);
        assert_eq!(page2.pagination.next, None);
        assert_eq!(page2.pagination.prev, Some(PageRef { page: 1, limit: 25 }));
    }

    #[tokio::test]
    async fn list_applies_filters_and_sort() {
        let service = test_service().await;
        service
            .create(provider_fields("North Spa", "Chiang Mai", "50000"))
            .await
            .unwrap();
        service
            .create(provider_fields("City Spa", "Bangkok", "10110"))
            .await
            .unwrap();
        service
            .create(provider_fields("River Spa", "Bangkok", "10600"))
            .await
            .unwrap();

        let page = service
            .list(
                &parse_list_params(&query(&[("province", "Bangkok"), ("sort", "name")])).unwrap(),
            )
            .await
            .unwrap();
        let names: Vec<&str> = page.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["City Spa", "River Spa"]);

        let page = service
            .list(&parse_list_params(&query(&[("postalcode[gte]", "10600")])).unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = page.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"North Spa"));
        assert!(names.contains(&"River Spa"));
    }

    #[tokio::test]
    async fn create_validates_required_fields() {
        let service = test_service().await;

        assert!(matches!(
            service.create(provider_fields("", "Bangkok", "10110")).await,
            Err(ApiError::Validation(_))
        ));

        assert!(matches!(
            service
                .create(provider_fields("Spa", "Bangkok", "101"))
                .await,
            Err(ApiError::Validation(_))
        ));

        let mut no_tel = provider_fields("Spa", "Bangkok", "10110");
        no_tel.tel = String::new();
        assert!(matches!(
            service.create(no_tel).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_cascades_to_bookings() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        let db = Arc::new(pool);
        let service = CatalogService::new(db.clone());

        let provider = service
            .create(provider_fields("City Spa", "Bangkok", "10110"))
            .await
            .unwrap();

        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, name, phone, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?, 'user', ?)",
        )
        .bind(user_id)
        .bind("Test User")
        .bind("02-0000000")
        .bind("cascade@example.com")
        .bind("$2b$12$abcdefghijklmnopqrstuv")
        .bind(Utc::now())
        .execute(&*db)
        .await
        .unwrap();
        for status in ["active", "deleted"] {
            sqlx::query(
                "INSERT INTO bookings (id, booking_date, user_id, provider_id, status, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4())
            .bind(Utc::now())
            .bind(user_id)
            .bind(provider.id)
            .bind(status)
            .bind(Utc::now())
            .execute(&*db)
            .await
            .unwrap();
        }

        service.delete(provider.id).await.unwrap();

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE provider_id = ?")
                .bind(provider.id)
                .fetch_one(&*db)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(
            service.get(provider.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(provider.id).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_and_get_round_trip() {
        let service = test_service().await;
        let created = service
            .create(provider_fields("City Spa", "Bangkok", "10110"))
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                ProviderUpdate {
                    name: Some("City Spa & Wellness".into()),
                    address: None,
                    district: None,
                    province: None,
                    postalcode: None,
                    tel: None,
                    region: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "City Spa & Wellness");
        assert_eq!(updated.province, "Bangkok");

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "City Spa & Wellness");

        assert!(matches!(
            service.get(Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update(
                    Uuid::new_v4(),
                    ProviderUpdate {
                        name: Some("Ghost".into()),
                        address: None,
                        district: None,
                        province: None,
                        postalcode: None,
                        tel: None,
                        region: None,
                    },
                )
                .await,
            Err(ApiError::NotFound(_))
        ));
    }
}

use crate::api::stock;
use crate::error::ErrorBody;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "kessan", description = "Normalized Yahoo Finance stock data"),
    paths(stock::stock, stock::history),
    components(schemas(ErrorBody)),
    tags((name = "stock", description = "Per-ticker financial data"))
)]
pub struct ApiDoc;

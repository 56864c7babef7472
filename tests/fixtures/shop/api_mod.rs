//! @APIVersion 1.0.0
//! @APITitle Shop API
//! @APIDescription Widgets and the people who own them.
//! @Contact shop@example.com
//! @License MIT
//! @LicenseUrl https://opensource.org/licenses/MIT
//! @BasePath /api/v1

pub mod widgets;

/// Liveness probe used by the load balancer.
///
/// @Title Health check
/// @Success 200 {object} string "Service is up"
/// @Router / [get]
pub async fn health() -> &'static str {
    "ok"
}

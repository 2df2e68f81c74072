//! # Routes
//!
//! The minimal surface needed to exercise the admission pipeline.
//!
//! | Route                      | Module          | Behind admission |
//! |----------------------------|-----------------|------------------|
//! | `POST /auth/refresh`       | [`auth`]        | no (client limit) |
//! | `GET /v1/me`               | [`identity`]    | yes              |
//! | `GET /v1/tenants/{id}`     | [`tenants`]     | yes              |
//! | `GET /v1/admin/rate-limits`| [`admin`]       | yes, admin only  |

pub mod admin;
pub mod auth;
pub mod identity;
pub mod tenants;

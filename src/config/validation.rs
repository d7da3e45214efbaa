//! Validation rules for auth configuration.
//!
//! Every rule runs and every violation is reported, so a broken
//! configuration file can be fixed in one pass.

use super::error::ConfigViolation;
use super::UserPoolConfiguration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

/// Run all user pool rules, accumulating violations.
pub fn validate_user_pool(pool: &UserPoolConfiguration) -> Check {
    let checks: Vec<Check> = vec![
        non_empty("PoolId", &pool.pool_id),
        non_empty("AppClientId", &pool.app_client),
        region_format(&pool.region),
        pool_matches_region(pool),
    ];

    Validation::all_vec(checks).map(|_| ())
}

fn non_empty(field: &'static str, value: &str) -> Check {
    if value.trim().is_empty() {
        Validation::fail(ConfigViolation::EmptyField { field })
    } else {
        Validation::success(())
    }
}

/// Regions look like `us-east-1` or `ap-southeast-2`.
fn region_format(region: &str) -> Check {
    let parts: Vec<&str> = region.split('-').collect();
    let well_formed = parts.len() >= 3
        && parts[0].len() == 2
        && parts[..parts.len() - 1]
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
        && parts[parts.len() - 1]
            .chars()
            .all(|c| c.is_ascii_digit())
        && !parts[parts.len() - 1].is_empty();

    if well_formed {
        Validation::success(())
    } else {
        Validation::fail(ConfigViolation::MalformedRegion {
            region: region.to_string(),
        })
    }
}

/// Pool ids are `<region>_<id>`; ids without a prefix are left alone.
fn pool_matches_region(pool: &UserPoolConfiguration) -> Check {
    match pool.pool_id.split_once('_') {
        Some((prefix, _)) if prefix != pool.region => {
            Validation::fail(ConfigViolation::PoolRegionMismatch {
                pool_id: pool.pool_id.clone(),
                region: pool.region.clone(),
            })
        }
        _ => Validation::success(()),
    }
}

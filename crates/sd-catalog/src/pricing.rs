//! Monthly price lookup for the wizard's summary panel.

use sd_store::models::ServerType;

/// Backup surcharge as a fraction of the base monthly price.
const BACKUP_SURCHARGE: f64 = 0.20;

/// Monthly gross price for `type_name` at `location`, as a two-decimal
/// string. Falls back to the first price tier when the location has no
/// dedicated tier; `None` when the type is unknown, has no tiers, or
/// carries an unparsable price.
pub fn monthly_price(
    types: &[ServerType],
    type_name: &str,
    location: &str,
    backups: bool,
) -> Option<String> {
    let server_type = types.iter().find(|t| t.name == type_name)?;
    let tier = server_type
        .prices
        .iter()
        .find(|p| p.location == location)
        .or_else(|| server_type.prices.first())?;

    let base: f64 = tier.price_monthly.trim().parse().ok()?;
    let total = if backups {
        base + base * BACKUP_SURCHARGE
    } else {
        base
    };
    Some(format!("{total:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_store::models::PriceTier;

    fn types() -> Vec<ServerType> {
        vec![ServerType {
            id: 1,
            name: "cx22".into(),
            cores: 2,
            memory: 4.0,
            disk: 40,
            architecture: "x86".into(),
            prices: vec![
                PriceTier {
                    location: "fsn1".into(),
                    price_monthly: "4.50".into(),
                    price_hourly: None,
                },
                PriceTier {
                    location: "ash".into(),
                    price_monthly: "5.20".into(),
                    price_hourly: None,
                },
            ],
        }]
    }

    #[test]
    fn finds_the_location_tier() {
        assert_eq!(monthly_price(&types(), "cx22", "ash", false).as_deref(), Some("5.20"));
    }

    #[test]
    fn unknown_location_falls_back_to_first_tier() {
        assert_eq!(monthly_price(&types(), "cx22", "sin", false).as_deref(), Some("4.50"));
    }

    #[test]
    fn backups_add_twenty_percent() {
        assert_eq!(monthly_price(&types(), "cx22", "fsn1", true).as_deref(), Some("5.40"));
    }

    #[test]
    fn unknown_type_or_empty_tiers_yield_none() {
        assert_eq!(monthly_price(&types(), "cpx99", "fsn1", false), None);

        let bare = vec![ServerType {
            prices: vec![],
            ..types().remove(0)
        }];
        assert_eq!(monthly_price(&bare, "cx22", "fsn1", false), None);
    }

    #[test]
    fn unparsable_price_yields_none() {
        let mut broken = types();
        broken[0].prices[0].price_monthly = "free".into();
        assert_eq!(monthly_price(&broken, "cx22", "fsn1", false), None);
    }
}

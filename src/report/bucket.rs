//! Channel-attribution buckets.
//!
//! Every raw row maps to exactly one of seven canonical buckets. The rule
//! table is ordered and first-match wins: `direct` (in either the channel or
//! the referring platform) takes the row before any channel-specific rule
//! gets a look. That ordering is the observed business rule, not an
//! implementation accident: keep the table in this order.

use serde::{Deserialize, Serialize};

/// The seven canonical attribution buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    DirectOrganic,
    GoogleAdsPaid,
    GoogleOrganic,
    AttentiveSMS,
    PriveyEmail,
    ActiveCampaign,
    OtherMisc,
}

/// Sales-column order in the summary row.
pub const SALES_BUCKETS: [Bucket; 7] = [
    Bucket::DirectOrganic,
    Bucket::GoogleAdsPaid,
    Bucket::GoogleOrganic,
    Bucket::AttentiveSMS,
    Bucket::PriveyEmail,
    Bucket::ActiveCampaign,
    Bucket::OtherMisc,
];

/// Buckets that carry a reported cost column, in summary-row order.
pub const COST_BUCKETS: [Bucket; 3] = [
    Bucket::GoogleAdsPaid,
    Bucket::PriveyEmail,
    Bucket::AttentiveSMS,
];

impl Bucket {
    /// Classify a raw row by `(referring_platform, channel, type)`.
    ///
    /// Total: absent values are treated as empty strings, comparison is
    /// trimmed and case-insensitive, and anything unmatched lands in
    /// [`Bucket::OtherMisc`].
    pub fn classify(referring_platform: &str, channel: &str, channel_type: &str) -> Bucket {
        let rp = referring_platform.trim().to_ascii_lowercase();
        let ch = channel.trim().to_ascii_lowercase();
        let ty = channel_type.trim().to_ascii_lowercase();

        if ch == "direct" || rp == "direct" {
            return Bucket::DirectOrganic;
        }
        if ch == "google" && ty == "paid" {
            return Bucket::GoogleAdsPaid;
        }
        if ch == "google" && ty == "organic" {
            return Bucket::GoogleOrganic;
        }
        if ch == "attentive" || rp == "attentive" {
            return Bucket::AttentiveSMS;
        }
        if ch == "privy" || rp == "privy" {
            return Bucket::PriveyEmail;
        }
        if ch == "activecampaign" || rp == "activecampaign" {
            return Bucket::ActiveCampaign;
        }
        Bucket::OtherMisc
    }

    /// Column-name stem used in the summary header.
    pub fn column_stem(&self) -> &'static str {
        match self {
            Bucket::DirectOrganic => "DirectOrganic",
            Bucket::GoogleAdsPaid => "GoogleAdsPaid",
            Bucket::GoogleOrganic => "GoogleOrganic",
            Bucket::AttentiveSMS => "AttentiveSMS",
            Bucket::PriveyEmail => "PriveyEmail",
            Bucket::ActiveCampaign => "ActiveCampaign",
            Bucket::OtherMisc => "OtherMisc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_direct_beats_channel_rules() {
        // Referring platform says direct, channel says email: direct wins.
        assert_eq!(
            Bucket::classify("Direct", "email", "organic"),
            Bucket::DirectOrganic
        );
        assert_eq!(
            Bucket::classify("", "direct", "paid"),
            Bucket::DirectOrganic
        );
    }

    #[test]
    fn test_classify_google_split_by_type() {
        assert_eq!(
            Bucket::classify("", "google", "paid"),
            Bucket::GoogleAdsPaid
        );
        assert_eq!(
            Bucket::classify("", "google", "organic"),
            Bucket::GoogleOrganic
        );
        // Google with an unknown type falls through to the catch-all.
        assert_eq!(Bucket::classify("", "google", "cpc"), Bucket::OtherMisc);
    }

    #[test]
    fn test_classify_platform_rules_match_either_field() {
        assert_eq!(
            Bucket::classify("attentive", "", ""),
            Bucket::AttentiveSMS
        );
        assert_eq!(Bucket::classify("", "attentive", ""), Bucket::AttentiveSMS);
        assert_eq!(Bucket::classify("Privy", "", ""), Bucket::PriveyEmail);
        assert_eq!(
            Bucket::classify("", "ActiveCampaign", ""),
            Bucket::ActiveCampaign
        );
    }

    #[test]
    fn test_classify_is_case_insensitive_and_trimmed() {
        assert_eq!(
            Bucket::classify("  GOOGLE  ", "google", "  Paid "),
            Bucket::GoogleAdsPaid
        );
        assert_eq!(Bucket::classify("", " DIRECT ", ""), Bucket::DirectOrganic);
    }

    #[test]
    fn test_classify_is_total() {
        // No combination errors; empty and junk inputs land in OtherMisc.
        assert_eq!(Bucket::classify("", "", ""), Bucket::OtherMisc);
        assert_eq!(
            Bucket::classify("facebook", "social", "paid"),
            Bucket::OtherMisc
        );
        assert_eq!(
            Bucket::classify("\u{00a0}", "unknown", "???"),
            Bucket::OtherMisc
        );
    }
}

use serde::Deserialize;

use crate::api::ApiError;

/// Envelope returned by the get-point endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PointResponse {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<PointData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointData {
    #[serde(rename = "rewardPoint")]
    pub reward_point: RewardPoint,
    #[serde(rename = "referralPoint")]
    pub referral_point: ReferralPoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardPoint {
    pub points: f64,
    pub registerpoints: f64,
    pub signinpoints: f64,
    pub twitter_x_id_points: f64,
    pub discordid_points: f64,
    pub telegramid_points: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralPoint {
    pub commission: f64,
}

/// The seven point categories that make up an account's balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointBreakdown {
    pub reward: f64,
    pub registration: f64,
    pub sign_in: f64,
    pub twitter: f64,
    pub discord: f64,
    pub telegram: f64,
    pub referral_commission: f64,
}

impl PointBreakdown {
    pub fn total(&self) -> f64 {
        self.reward
            + self.registration
            + self.sign_in
            + self.twitter
            + self.discord
            + self.telegram
            + self.referral_commission
    }
}

impl PointResponse {
    /// Extract the breakdown; `status: false` is an error, never a zero total
    pub fn into_breakdown(self) -> Result<PointBreakdown, ApiError> {
        if !self.status {
            return Err(ApiError::rejected(&self.message));
        }
        let data = self
            .data
            .ok_or_else(|| ApiError::InvalidResponse("point response has no data".to_string()))?;
        Ok(PointBreakdown {
            reward: data.reward_point.points,
            registration: data.reward_point.registerpoints,
            sign_in: data.reward_point.signinpoints,
            twitter: data.reward_point.twitter_x_id_points,
            discord: data.reward_point.discordid_points,
            telegram: data.reward_point.telegramid_points,
            referral_commission: data.referral_point.commission,
        })
    }
}

/// Parse a raw get-point body into a breakdown
pub fn parse_points(body: &str) -> Result<PointBreakdown, ApiError> {
    let response: PointResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("unexpected point payload: {}", e)))?;
    response.into_breakdown()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": true,
        "message": "success",
        "data": {
            "rewardPoint": {
                "_id": "66b0",
                "points": 1200.5,
                "registerpoints": 100,
                "signinpoints": 50,
                "twitter_x_id_points": 5000,
                "discordid_points": 5000,
                "telegramid_points": 5000,
                "lastKeepAlive": "2024-08-01T09:00:00.000Z"
            },
            "referralPoint": {"commission": 34.25, "referralCode": "abc"}
        }
    }"#;

    #[test]
    fn test_parse_points_total() {
        let breakdown = parse_points(SAMPLE).expect("sample should parse");
        assert_eq!(breakdown.total(), 16384.75);
        assert_eq!(breakdown.referral_commission, 34.25);
    }

    #[test]
    fn test_field_order_does_not_change_total() {
        let permuted = r#"{
            "data": {
                "referralPoint": {"commission": 34.25},
                "rewardPoint": {
                    "telegramid_points": 5000,
                    "signinpoints": 50,
                    "discordid_points": 5000,
                    "points": 1200.5,
                    "twitter_x_id_points": 5000,
                    "registerpoints": 100
                }
            },
            "status": true
        }"#;
        let a = parse_points(SAMPLE).unwrap().total();
        let b = parse_points(permuted).unwrap().total();
        assert_eq!(a, b);
    }

    #[test]
    fn test_status_false_is_error_not_zero() {
        let body = r#"{"status": false, "message": "Session expired", "data": null}"#;
        match parse_points(body) {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Session expired"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(parse_points("not json"), Err(ApiError::InvalidResponse(_))));
        let missing_field = r#"{"status": true, "data": {"rewardPoint": {"points": 1}, "referralPoint": {"commission": 0}}}"#;
        assert!(matches!(parse_points(missing_field), Err(ApiError::InvalidResponse(_))));
        let no_data = r#"{"status": true}"#;
        assert!(matches!(parse_points(no_data), Err(ApiError::InvalidResponse(_))));
    }
}

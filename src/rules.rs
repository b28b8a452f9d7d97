use crate::models::{CommunityMetrics, StageBreakdown, Strategy};

pub const STRONG_CLICK_RATE: f64 = 50.0;
pub const WEAK_CLICK_RATE: f64 = 30.0;
pub const EXCELLENT_WATCH_TIME: f64 = 5.0;

pub const CLICK_RATE_TARGET: f64 = 40.0;
pub const PLAY_RATE_TARGET: f64 = 70.0;
pub const WATCH_TIME_TARGET: f64 = 3.0;

pub fn generate_insights(metrics: &CommunityMetrics) -> Vec<String> {
    let mut insights = Vec::new();

    // Rates between the two click thresholds produce no click-rate message.
    if metrics.click_rate > STRONG_CLICK_RATE {
        insights.push(format!(
            "Strong initial engagement with {}% click rate",
            one_decimal(metrics.click_rate)
        ));
    } else if metrics.click_rate < WEAK_CLICK_RATE {
        insights.push(format!(
            "Opportunity to improve initial engagement ({}% click rate)",
            one_decimal(metrics.click_rate)
        ));
    }

    if metrics.avg_play_time > EXCELLENT_WATCH_TIME {
        insights.push(format!(
            "Excellent average watch time of {} minutes",
            one_decimal(metrics.avg_play_time)
        ));
    }

    if let Some(stage) = top_stage_by_plays(&metrics.stage_breakdown) {
        insights.push(format!("Strongest performance in {stage} stage"));
    }

    insights
}

/// One decimal place, with halves rounded away from zero.
pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Stage with the most plays. Ties go to the stage seen first in the data.
pub fn top_stage_by_plays(breakdown: &StageBreakdown) -> Option<&str> {
    let mut stages = breakdown.iter();
    let (mut best_stage, mut best) = stages.next()?;

    for (stage, metrics) in stages {
        if metrics.plays > best.plays {
            best_stage = stage;
            best = metrics;
        }
    }

    Some(best_stage)
}

pub fn generate_strategies(metrics: &CommunityMetrics) -> Vec<Strategy> {
    let mut strategies = Vec::new();

    if metrics.click_rate < CLICK_RATE_TARGET {
        strategies.push(strategy(
            "Improve Initial Engagement",
            &[
                "Personalize invite subject lines with the recipient's name",
                "Test sending invites at different times of day",
                "Add a short teaser or thumbnail to the invite",
                "Send a reminder to recipients who have not clicked within 48 hours",
            ],
        ));
    }

    if metrics.play_rate < PLAY_RATE_TARGET {
        strategies.push(strategy(
            "Increase Play Rate",
            &[
                "Place the video above the fold on the landing page",
                "Use a custom thumbnail that shows a face",
                "State the video length next to the play button",
                "Follow up with clickers who did not press play",
            ],
        ));
    }

    if metrics.avg_play_time < WATCH_TIME_TARGET {
        strategies.push(strategy(
            "Extend Watch Time",
            &[
                "Open with the key message in the first 30 seconds",
                "Shorten videos to focus on a single topic",
                "Add captions for viewers watching without sound",
                "End with a clear call to action that invites a reply",
            ],
        ));
    }

    strategies
}

fn strategy(focus: &str, actions: &[&str]) -> Strategy {
    Strategy {
        focus: focus.to_string(),
        actions: actions.iter().map(|action| action.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(click_rate: f64, play_rate: f64, avg_play_time: f64) -> CommunityMetrics {
        let mut stage_breakdown = StageBreakdown::new();
        stage_breakdown.entry("Welcome").plays = 10.0;
        CommunityMetrics {
            click_rate,
            play_rate,
            avg_play_time,
            stage_breakdown,
            ..CommunityMetrics::default()
        }
    }

    fn focuses(strategies: &[Strategy]) -> Vec<&str> {
        strategies.iter().map(|s| s.focus.as_str()).collect()
    }

    #[test]
    fn click_rate_boundaries_are_exclusive() {
        for rate in [30.0, 40.0, 50.0] {
            let insights = generate_insights(&metrics(rate, 80.0, 4.0));
            assert_eq!(insights, vec!["Strongest performance in Welcome stage"]);
        }

        let low = generate_insights(&metrics(29.9, 80.0, 4.0));
        assert_eq!(low[0], "Opportunity to improve initial engagement (29.9% click rate)");

        let high = generate_insights(&metrics(50.1, 80.0, 4.0));
        assert_eq!(high[0], "Strong initial engagement with 50.1% click rate");
    }

    #[test]
    fn insights_follow_rule_order() {
        let insights = generate_insights(&metrics(62.0, 80.0, 6.3));
        assert_eq!(
            insights,
            vec![
                "Strong initial engagement with 62.0% click rate",
                "Excellent average watch time of 6.3 minutes",
                "Strongest performance in Welcome stage",
            ]
        );
    }

    #[test]
    fn halves_round_up_in_messages() {
        let insights = generate_insights(&metrics(12.25, 80.0, 5.25));
        assert_eq!(
            insights,
            vec![
                "Opportunity to improve initial engagement (12.3% click rate)",
                "Excellent average watch time of 5.3 minutes",
                "Strongest performance in Welcome stage",
            ]
        );

        assert_eq!(one_decimal(60.0), "60.0");
        assert_eq!(one_decimal(66.65), "66.7");
    }

    #[test]
    fn watch_time_of_exactly_five_is_not_excellent() {
        let insights = generate_insights(&metrics(40.0, 80.0, 5.0));
        assert!(insights.iter().all(|i| !i.contains("watch time")));
    }

    #[test]
    fn top_stage_prefers_first_seen_on_ties() {
        let mut breakdown = StageBreakdown::new();
        breakdown.entry("Welcome").plays = 5.0;
        breakdown.entry("Reminder").plays = 9.0;
        breakdown.entry("Final").plays = 9.0;
        assert_eq!(top_stage_by_plays(&breakdown), Some("Reminder"));

        assert_eq!(top_stage_by_plays(&StageBreakdown::new()), None);
    }

    #[test]
    fn no_stage_insight_without_stages() {
        let metrics = CommunityMetrics {
            click_rate: 40.0,
            ..CommunityMetrics::default()
        };
        assert!(generate_insights(&metrics).is_empty());
    }

    #[test]
    fn strategies_fire_in_fixed_order() {
        let strategies = generate_strategies(&metrics(10.0, 20.0, 1.0));
        assert_eq!(
            focuses(&strategies),
            vec!["Improve Initial Engagement", "Increase Play Rate", "Extend Watch Time"]
        );
        assert!(strategies.iter().all(|s| s.actions.len() == 4));
    }

    #[test]
    fn healthy_community_gets_no_strategies() {
        assert!(generate_strategies(&metrics(40.0, 70.0, 3.0)).is_empty());
    }

    #[test]
    fn watch_time_gate_is_strict() {
        let at_target = generate_strategies(&metrics(60.0, 90.0, 3.0));
        assert!(at_target.is_empty());

        let below = generate_strategies(&metrics(60.0, 90.0, 2.999));
        assert_eq!(focuses(&below), vec!["Extend Watch Time"]);
    }
}

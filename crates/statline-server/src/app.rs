// Request dispatch: one JSON request in, one JSON envelope out.

use serde_json::json;
use statline_core::{RecordFilter, RecordStore};
use statline_engine::StatsService;
use tracing::{debug, warn};

use crate::protocol::{ErrorKind, Request, Response};

/// Parse `raw` as a [`Request`], run it against `service`, and encode the
/// reply envelope.
pub fn handle_message<S: RecordStore>(service: &StatsService<S>, raw: &str) -> String {
    let response = match serde_json::from_str::<Request>(raw) {
        Ok(request) => handle_request(service, request),
        Err(e) => {
            warn!("Rejected malformed request: {e}");
            Response::failure(ErrorKind::BadRequest, format!("malformed request: {e}"))
        }
    };
    response.to_json()
}

/// Run one parsed request.
pub fn handle_request<S: RecordStore>(service: &StatsService<S>, request: Request) -> Response {
    debug!("Dispatching {} request", request.name());

    let result = match request {
        Request::Health => return Response::success(json!({ "status": "ok" })),
        Request::Stats { player_name: None } => {
            service.list_stat_lines().map(|lines| Response::from_data(&lines))
        }
        Request::Stats {
            player_name: Some(name),
        } => service
            .player_stat_lines(&name)
            .map(|lines| Response::from_data(&lines)),
        Request::Players => service
            .list_distinct_player_names()
            .map(|names| Response::from_data(&names)),
        Request::Chart {
            kind,
            season,
            players,
        } => {
            let filter = RecordFilter::all()
                .with_season(season)
                .with_players(players);
            service
                .list_chart(kind, &filter)
                .map(|dataset| Response::from_data(&dataset))
        }
        Request::Compare { players, season } => service
            .compare(&players, season)
            .map(|result| Response::from_data(&result)),
    };

    result.unwrap_or_else(|e| {
        debug!("Request failed: {e}");
        Response::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use statline_core::{MemoryStore, PlayerSeasonRecord};

    fn rec(season: i32, name: &str, gp: u32, goals: u32, assists: u32, shots: u32) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            season,
            player_name: name.into(),
            team: "COL".into(),
            games_played: gp,
            time_on_ice_seconds: gp * 1260,
            shots,
            goals,
            assists,
            points: goals + assists,
            scouting_grade: 9,
        }
    }

    fn service() -> StatsService<MemoryStore> {
        StatsService::new(MemoryStore::new(vec![
            rec(2023, "MacKinnon, Nathan", 82, 51, 89, 405),
            rec(2023, "Makar, Cale", 77, 21, 69, 230),
        ]))
    }

    fn call(raw: &str) -> Value {
        serde_json::from_str(&handle_message(&service(), raw)).unwrap()
    }

    #[test]
    fn health_reports_ok() {
        assert_eq!(call(r#"{"type":"health"}"#)["data"]["status"], "ok");
    }

    #[test]
    fn stats_for_unknown_player_is_empty_list() {
        let value = call(r#"{"type":"stats","player_name":"Nobody"}"#);
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"], Value::Array(vec![]));
    }

    #[test]
    fn stats_include_team_full_name() {
        let value = call(r#"{"type":"stats"}"#);
        assert_eq!(value["data"][0]["player_name"], "MacKinnon, Nathan");
        assert_eq!(value["data"][0]["team_full_name"], "Colorado Avalanche");
        assert_eq!(value["data"][0]["points_per_game"], 1.71);
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let value = call("{not json");
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"]["kind"], "bad_request");
    }

    #[test]
    fn compare_with_one_player_is_invalid_argument() {
        let value = call(r#"{"type":"compare","players":["Makar, Cale"]}"#);
        assert_eq!(value["error"]["kind"], "invalid_argument");
    }

    #[test]
    fn chart_filters_by_player() {
        let value = call(r#"{"type":"chart","kind":"total-points","players":["Makar, Cale"]}"#);
        let rows = value["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["points"], 90);
    }
}

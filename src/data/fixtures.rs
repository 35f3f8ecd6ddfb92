//! Small in-memory logs shared by tests
//!
//! Four dates of NYY at BOS. Each team has one starter per game; New York
//! adds a reliever on day 4 and Boston an opener who loses the start on
//! batters faced.

use chrono::NaiveDate;

use super::tables::{read_pitching_log, read_team_batting, read_team_pitching};
use super::GameLogs;

pub const PITCHING: &str = "\
Player,Team,Opp,Date,Unnamed: 5,IP,ER,H,BB,BF,SO
Gerrit Cole,NYY,BOS,2025-04-01,@,6.0,2,5,1,24,8
Gerrit Cole,NYY,BOS,2025-04-02,@,6.1,1,4,2,25,7
Gerrit Cole,NYY,BOS,2025-04-03,@,5.2,3,6,1,24,6
Gerrit Cole,NYY,BOS,2025-04-04,@,7.0,0,3,0,25,9
Clay Holmes,NYY,BOS,2025-04-04,@,1.0,0,0,0,3,1
Brayan Bello,BOS,NYY,2025-04-01,,5.0,3,7,2,23,4
Brayan Bello,BOS,NYY,2025-04-02,,6.0,2,5,1,24,5
Brayan Bello,BOS,NYY,2025-04-03,,6.2,1,4,1,25,6
Brayan Bello,BOS,NYY,2025-04-04,,4.0,4,7,2,22,3
Opener Guy,BOS,NYY,2025-04-04,,4.0,0,2,0,14,2
";

pub const BATTING: &str = "\
Team,Opp,Date,R,OBP
NYY,BOS,2025-04-01,4,.320
NYY,BOS,2025-04-02,5,.330
NYY,BOS,2025-04-03,6,.340
NYY,BOS,2025-04-04,7,.350
BOS,NYY,2025-04-01,2,.280
BOS,NYY,2025-04-02,3,.300
BOS,NYY,2025-04-03,4,.310
BOS,NYY,2025-04-04,1,.290
";

pub const TEAM_PITCHING: &str = "\
Team,Date,ER,H,BB,IP
NYY,2025-04-01,2,7,2,9.0
NYY,2025-04-02,3,8,1,9.0
NYY,2025-04-03,4,9,3,9.0
NYY,2025-04-04,1,5,0,9.0
BOS,2025-04-01,4,9,3,8.0
BOS,2025-04-02,5,10,1,8.0
BOS,2025-04-03,6,8,3,8.0
BOS,2025-04-04,7,11,2,8.0
";

pub fn sample_logs() -> GameLogs {
    GameLogs {
        pitching: read_pitching_log(PITCHING.as_bytes()).unwrap(),
        batting: read_team_batting(BATTING.as_bytes()).unwrap(),
        team_pitching: read_team_pitching(TEAM_PITCHING.as_bytes()).unwrap(),
    }
}

pub fn april(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
}

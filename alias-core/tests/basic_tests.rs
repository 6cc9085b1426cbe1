mod common;

use alias_core::{Role, RoomEvent, WordBank};
use alias_types::{Difficulty, GameStatus, Language, ROUND_DURATION};
use common::*;
use rand::Rng;

#[test]
fn test_guest_wins_two_player_game() {
    let mut rng = test_rng();
    let mut table = Table::seat(("host1", "Hana"), &[("guest1", "Gus")], english_easy(3), &mut rng);
    assert_eq!(table.rooms[1].state().players.len(), 2);

    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    assert_eq!(table.rooms[1].state().status, GameStatus::Playing);
    assert!(!table.rooms[1].is_my_turn());

    for _ in 0..3 {
        let out = table.rooms[1].correct_guess(&mut rng).unwrap();
        table.broadcast(1, out);
    }
    assert_eq!(table.host().state().player("guest1").unwrap().score, 3);
    assert_eq!(table.rooms[1].state().status, GameStatus::Playing);

    // Run the host's countdown until the game ends.
    let mut ticks = 0;
    while table.host().state().status == GameStatus::Playing {
        let out = table.host().tick(&mut rng).unwrap();
        table.broadcast(0, out);
        ticks += 1;
        assert!(ticks <= ROUND_DURATION + 1, "game never ended");
    }

    for room in &table.rooms {
        assert_eq!(room.state().status, GameStatus::GameOver);
        let leaderboard = room.leaderboard();
        assert_eq!(leaderboard[0].id, "guest1");
        assert_eq!(leaderboard[0].score, 3);
    }
}

#[test]
fn test_mirrors_follow_countdown() {
    let mut rng = test_rng();
    let mut table = Table::seat(("h", "Hana"), &[("g", "Gus")], english_easy(10), &mut rng);

    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    for _ in 0..5 {
        let out = table.host().tick(&mut rng).unwrap();
        table.broadcast(0, out);
    }
    assert_eq!(table.rooms[1].state().time_left, ROUND_DURATION - 5);
    assert_eq!(table.rooms[1].state().current_word, table.rooms[0].state().current_word);
}

#[test]
fn test_turn_rotation_wraps_across_three_players() {
    let mut rng = test_rng();
    let mut table = Table::seat(
        ("a", "Ann"),
        &[("b", "Bob"), ("c", "Cid")],
        english_easy(100),
        &mut rng,
    );
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);

    let mut explainers = Vec::new();
    for _ in 0..4 {
        explainers.push(
            table.rooms[2]
                .state()
                .current_turn_player_id
                .clone()
                .unwrap(),
        );
        for _ in 0..=ROUND_DURATION {
            let out = table.host().tick(&mut rng).unwrap();
            table.broadcast(0, out);
        }
    }
    assert_eq!(explainers, vec!["a", "b", "c", "a"]);
    assert_eq!(table.rooms[1].state().round_number, 5);
}

#[test]
fn test_scores_never_decrease() {
    let mut rng = test_rng();
    let mut table = Table::seat(("h", "Hana"), &[("g", "Gus"), ("k", "Kim")], english_easy(15), &mut rng);
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);

    let ids = ["h", "g", "k"];
    let mut last: Vec<u32> = vec![0; 3];
    for _ in 0..500 {
        if table.host().state().status != GameStatus::Playing {
            break;
        }
        let actor = rng.gen_range(0..3);
        let (from, out) = match rng.gen_range(0..4) {
            0 => (actor, table.rooms[actor].correct_guess(&mut rng).unwrap()),
            1 => (actor, table.rooms[actor].skip(&mut rng).unwrap_or_default()),
            _ => (0, table.host().tick(&mut rng).unwrap()),
        };
        table.broadcast(from, out);

        for (index, id) in ids.iter().enumerate() {
            let score = table.host().state().player(id).unwrap().score;
            assert!(score >= last[index], "score for {} went down", id);
            last[index] = score;
        }
    }
}

#[test]
fn test_skip_leaves_scores_and_status() {
    let mut rng = test_rng();
    let mut table = Table::seat(("h", "Hana"), &[("g", "Gus")], english_easy(10), &mut rng);
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    let out = table.rooms[1].correct_guess(&mut rng).unwrap();
    table.broadcast(1, out);

    let before = table.rooms[1].state().players.clone();
    let out = table.host().skip(&mut rng).unwrap();
    table.broadcast(0, out);

    assert_eq!(table.rooms[1].state().players, before);
    assert_eq!(table.rooms[1].state().status, GameStatus::Playing);
    assert_eq!(table.rooms[1].state().current_word, table.rooms[0].state().current_word);
}

#[test]
fn test_host_failover_moves_timer_ownership() {
    let mut rng = test_rng();
    let mut table = Table::seat(("m", "Mia"), &[("q", "Quinn"), ("c", "Cal")], english_easy(10), &mut rng);
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);

    // Host vanishes; the remaining clients see the same snapshot.
    let host = table.rooms.remove(0);
    assert!(host.owns_timer());
    table.sync_presence(&[presence("q", "Quinn", false), presence("c", "Cal", false)]);

    let cal = table.rooms.iter().find(|r| r.me() == "c").unwrap();
    let quinn = table.rooms.iter().find(|r| r.me() == "q").unwrap();
    assert_eq!(cal.role(), Role::Host);
    assert!(cal.owns_timer());
    assert_eq!(quinn.role(), Role::Replica);
    assert_eq!(quinn.state().players.len(), 2);
}

#[test]
fn test_newcomer_joins_after_failover() {
    let mut rng = test_rng();
    let mut table = Table::seat(("m", "Mia"), &[("q", "Quinn"), ("c", "Cal")], english_easy(10), &mut rng);
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    let quinn = table.rooms.iter().position(|r| r.me() == "q").unwrap();
    let out = table.rooms[quinn].correct_guess(&mut rng).unwrap();
    table.broadcast(quinn, out);

    table.rooms.remove(0);
    table.sync_presence(&[presence("q", "Quinn", false), presence("c", "Cal", false)]);

    // "a" sorts lowest and arrives while Cal's presence still carries no claim.
    let code = table.rooms[0].room_id().to_string();
    table.rooms.push(alias_core::Room::join("a".to_string(), "Ava", &code).unwrap());
    table.sync_presence(&[
        presence("q", "Quinn", false),
        presence("c", "Cal", false),
        presence("a", "Ava", false),
    ]);

    for room in &table.rooms {
        let state = room.state();
        assert_eq!(state.status, GameStatus::Playing, "{} lost the game", room.me());
        assert_eq!(state.target_score, 10);
        assert_eq!(state.player("q").unwrap().score, 1);
        let hosts: Vec<&str> = state.players.iter().filter(|p| p.is_host).map(|p| p.id.as_str()).collect();
        assert_eq!(hosts, vec!["c"]);
    }
    let owners: Vec<&str> = table.rooms.iter().filter(|r| r.owns_timer()).map(|r| r.me()).collect();
    assert_eq!(owners, vec!["c"]);

    // Once Cal re-announces the claim nothing moves.
    table.sync_presence(&[
        presence("q", "Quinn", false),
        presence("c", "Cal", true),
        presence("a", "Ava", false),
    ]);
    let ava = table.rooms.iter().find(|r| r.me() == "a").unwrap();
    assert_eq!(ava.role(), Role::Replica);
    assert_eq!(ava.state().player("q").unwrap().score, 1);
}

#[test]
fn test_presence_churn_keeps_scores() {
    let mut rng = test_rng();
    let mut table = Table::seat(("h", "Hana"), &[("g", "Gus")], english_easy(10), &mut rng);
    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    for _ in 0..2 {
        let out = table.rooms[1].correct_guess(&mut rng).unwrap();
        table.broadcast(1, out);
    }

    let snapshot = vec![
        presence("h", "Hana", true),
        presence("g", "Gus", false),
        presence("n", "Nia", false),
    ];
    table.sync_presence(&snapshot);
    table.sync_presence(&snapshot);

    let host_state = table.host().state().clone();
    assert_eq!(host_state.players.len(), 3);
    assert_eq!(host_state.player("g").unwrap().score, 2);
    assert_eq!(host_state.player("n").unwrap().score, 0);
    assert_eq!(table.rooms[1].state(), &host_state);
}

#[test]
fn test_english_easy_draws() {
    let mut rng = test_rng();
    let table = Table::seat(("h", "Hana"), &[], english_easy(10), &mut rng);
    let list = WordBank::static_words(Language::En, Difficulty::Easy);
    for _ in 0..50 {
        let word = WordBank::draw(table.rooms[0].state(), &mut rng).unwrap();
        assert!(list.contains(&word.as_str()));
    }
}

#[test]
fn test_events_reach_view_layer() {
    let mut rng = test_rng();
    let mut table = Table::seat(("h", "Hana"), &[("g", "Gus")], english_easy(1), &mut rng);
    let collector = EventCollector::new();
    table.rooms[1].add_handler(Box::new(collector.clone()));

    let out = table.host().start_game(None, &mut rng).unwrap();
    table.broadcast(0, out);
    let out = table.rooms[1].correct_guess(&mut rng).unwrap();
    table.broadcast(1, out);
    table.host().tick(&mut rng).unwrap();

    assert!(collector.has_event_type(|e| matches!(e, RoomEvent::GameStarted { .. })));
    assert!(collector.has_event_type(|e| matches!(e, RoomEvent::ScoreChanged { score: 1, .. })));
    assert!(collector.has_event_type(|e| matches!(e, RoomEvent::WordChanged { .. })));
    assert!(!collector.has_event_type(|e| matches!(e, RoomEvent::GameOver { .. })));
    assert!(!collector.get_events().is_empty());
}

use std::io::{self, BufRead, Write};

use gambit::ai::engine::{AiEngine, TreeSearchAi};
use gambit::config::AppConfig;
use gambit::engine::{Color, Game, Move, MoveOutcome, PieceKind, parse_move};

fn main() {
    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gambit=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let ai = TreeSearchAi::new(config.node_budget);
    let mut game = Game::new();
    match config.ai_color {
        Color::White => game.white_player = "Computer".into(),
        Color::Black => game.black_player = "Computer".into(),
    }

    tracing::info!(
        "gambit v{} — game {}: you play {}, the engine plays {} (budget {})",
        env!("CARGO_PKG_VERSION"),
        game.id,
        !config.ai_color,
        config.ai_color,
        config.node_budget
    );

    println!("Enter moves as coordinate pairs like e2e4. Type 'quit' to resign.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while !game.is_over() {
        if game.turn() == config.ai_color {
            let mv = match ai.select_move(&game) {
                Ok(mv) => mv,
                Err(e) => {
                    tracing::error!("engine failed to move: {e}");
                    break;
                }
            };
            apply_engine_move(&mut game, mv);
            println!("engine plays {mv}");
            continue;
        }

        println!("\n{}\n", game.board_text());
        if game.in_check(game.turn()) {
            println!("check!");
        }
        print!("{} to move> ", game.turn());
        let _ = io::stdout().flush();

        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => break, // stdin closed
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            println!("game abandoned.");
            return;
        }

        let (from, to) = match parse_move(input) {
            Ok(squares) => squares,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match game.attempt_move(from, to) {
            Ok(MoveOutcome::Applied) => {}
            Ok(MoveOutcome::AwaitingPromotion) => {
                resolve_promotion(&mut game, &mut lines);
            }
            Err(e) => println!("{e}"),
        }
    }

    println!("\n{}\n", game.board_text());
    println!("result: {}", game.status());
}

/// Apply a move the search already validated, queening if it promotes.
fn apply_engine_move(game: &mut Game, mv: Move) {
    match game.attempt_move(mv.from, mv.to) {
        Ok(MoveOutcome::AwaitingPromotion) => {
            let kind = mv.promotion.unwrap_or(PieceKind::Queen);
            game.promote(kind).expect("search chose a valid promotion");
        }
        Ok(MoveOutcome::Applied) => {}
        Err(e) => unreachable!("engine selected an illegal move {mv}: {e}"),
    }
}

/// Keep prompting until a valid promotion kind is supplied.
fn resolve_promotion(
    game: &mut Game,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) {
    loop {
        print!("promote to (q/r/b/n)> ");
        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            _ => {
                // stdin closed mid-promotion: queen and move on.
                let _ = game.promote(PieceKind::Queen);
                return;
            }
        };
        let kind = line.trim().chars().next().and_then(PieceKind::from_char);
        match kind {
            Some(kind) => match game.promote(kind) {
                Ok(()) => return,
                Err(e) => println!("{e}"),
            },
            None => println!("enter one of q, r, b, n"),
        }
    }
}

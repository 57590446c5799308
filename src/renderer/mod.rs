//! Canvas 2D rendering
//!
//! Draws the game state every frame in scene coordinates (origin top-left,
//! y down). The canvas backing store is scaled by the device pixel ratio.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::cosine_interpolate;
use crate::sim::{Bullet, Explosion, ExplosionKind, GameState, Player, RoundPhase, Tank, Wall};

const BACKGROUND: &str = "#000000";
const BAR_COLOR: &str = "#CCCCCC";
const WALL_COLOR: &str = "#CCCCCC";
const TITLE_RED: &str = "#DD0000";
const FONT: &str = "Audiowide, sans-serif";

/// Player colours: red for one, blue for two
fn player_color(player: Player) -> &'static str {
    match player {
        Player::One => "#FF0000",
        Player::Two => "#0000FF",
    }
}

/// `0xRRGGBB` as a CSS colour
fn css_hex(rgb: u32) -> String {
    format!("#{:06X}", rgb & 0xFF_FFFF)
}

pub struct Renderer {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
    top_bar: f64,
    dpr: f64,
}

impl Renderer {
    /// Size the canvas for the scene and grab its 2D context
    pub fn new(canvas: &HtmlCanvasElement, state: &GameState, dpr: f64) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let width = state.tuning.scene_width as f64;
        let height = state.tuning.scene_height as f64;
        canvas.set_width((width * dpr) as u32);
        canvas.set_height((height * dpr) as u32);

        log::info!("Canvas {}x{} at {dpr}x", width, height);

        Ok(Self {
            ctx,
            width,
            height,
            top_bar: state.tuning.top_bar_height as f64,
            dpr,
        })
    }

    /// Render one frame
    pub fn render(&self, state: &GameState, fps: Option<u32>) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)?;
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, self.width, self.height);

        if state.phase == RoundPhase::NotStarted {
            self.draw_start_screen()?;
        } else {
            self.draw_top_bar(state)?;
            for wall in &state.walls {
                self.draw_wall(wall);
            }
            for tank in state.tanks.iter().filter(|t| t.alive) {
                self.draw_tank(tank)?;
            }
            for bullet in state.bullets.iter().filter(|b| b.alive) {
                self.draw_bullet(bullet);
            }
            for explosion in &state.explosions {
                self.draw_explosion(explosion)?;
            }
            if state.paused {
                self.draw_paused()?;
            }
        }

        if let Some(fps) = fps {
            ctx.set_font(&format!("12px {FONT}"));
            ctx.set_text_align("right");
            ctx.set_fill_style_str("#00FF00");
            ctx.fill_text(&format!("{fps} fps"), self.width - 6.0, self.height - 6.0)?;
        }
        Ok(())
    }

    fn draw_start_screen(&self) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let cx = self.width / 2.0;
        ctx.set_text_align("center");

        ctx.set_font(&format!("96px {FONT}"));
        ctx.set_fill_style_str(TITLE_RED);
        ctx.fill_text("BALLISTIC", cx, self.height * 0.35)?;

        ctx.set_font(&format!("48px {FONT}"));
        ctx.set_fill_style_str("#FFFFFF");
        ctx.fill_text("PLAY", cx, self.height * 0.65)?;

        ctx.set_font(&format!("16px {FONT}"));
        ctx.set_fill_style_str(BAR_COLOR);
        ctx.fill_text(
            "Red: arrows + M    Blue: WASD + Q    Esc: pause",
            cx,
            self.height * 0.8,
        )?;
        Ok(())
    }

    fn draw_top_bar(&self, state: &GameState) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_fill_style_str(BAR_COLOR);
        ctx.fill_rect(0.0, 0.0, self.width, self.top_bar);

        ctx.set_text_align("center");
        ctx.set_font(&format!("40px {FONT}"));
        ctx.set_fill_style_str("#000000");
        ctx.fill_text("BALLISTIC", self.width / 2.0, self.top_bar * 0.7)?;

        ctx.set_font(&format!("18px {FONT}"));
        for player in Player::BOTH {
            let x = match player {
                Player::One => 60.0,
                Player::Two => self.width - 60.0,
            };
            ctx.set_fill_style_str(player_color(player));
            ctx.fill_text(player.name(), x, self.top_bar * 0.4)?;
            ctx.fill_text(
                &format!("Score {}", state.score(player)),
                x,
                self.top_bar * 0.8,
            )?;
        }
        Ok(())
    }

    fn draw_wall(&self, wall: &Wall) {
        let r = wall.rect;
        self.ctx.set_fill_style_str(WALL_COLOR);
        self.ctx
            .fill_rect(r.pos.x as f64, r.pos.y as f64, r.width as f64, r.height as f64);
    }

    /// Body plus barrel pointing along the tank's rotation
    fn draw_tank(&self, tank: &Tank) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let w = tank.width as f64;
        let h = tank.height as f64;

        ctx.save();
        ctx.translate(tank.position.x as f64, tank.position.y as f64)?;
        ctx.rotate(tank.rotation as f64)?;

        ctx.set_fill_style_str(player_color(tank.player));
        ctx.fill_rect(-w / 2.0, -h / 2.0, w, h);
        // treads
        ctx.set_fill_style_str("#444444");
        ctx.fill_rect(-w / 2.0, -h / 2.0, w, h * 0.15);
        ctx.fill_rect(-w / 2.0, h / 2.0 - h * 0.15, w, h * 0.15);
        // turret and barrel
        ctx.set_fill_style_str("#DDDDDD");
        ctx.begin_path();
        ctx.arc(0.0, 0.0, h * 0.22, 0.0, TAU)?;
        ctx.fill();
        ctx.fill_rect(0.0, -2.0, w * 0.65, 4.0);

        ctx.restore();
        Ok(())
    }

    fn draw_bullet(&self, bullet: &Bullet) {
        let r = bullet.bounds();
        self.ctx.set_fill_style_str(&css_hex(bullet.color()));
        self.ctx
            .fill_rect(r.pos.x as f64, r.pos.y as f64, r.width as f64, r.height as f64);
    }

    /// Expanding, fading disc
    fn draw_explosion(&self, explosion: &Explosion) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        let t = explosion.progress() as f64;
        let max_radius = match explosion.kind {
            ExplosionKind::TankDestroyed => 32.0,
            ExplosionKind::BulletExpired => 14.0,
        };

        ctx.set_global_alpha(1.0 - t);
        ctx.begin_path();
        ctx.arc(
            explosion.position.x as f64,
            explosion.position.y as f64,
            max_radius * cosine_interpolate(0.3, 1.0, t as f32) as f64,
            0.0,
            TAU,
        )?;
        ctx.set_fill_style_str(if t < 0.4 { "#FFDD33" } else { "#FF6600" });
        ctx.fill();
        ctx.set_global_alpha(1.0);
        Ok(())
    }

    fn draw_paused(&self) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.set_global_alpha(0.5);
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, self.top_bar, self.width, self.height - self.top_bar);
        ctx.set_global_alpha(1.0);

        ctx.set_text_align("center");
        ctx.set_font(&format!("48px {FONT}"));
        ctx.set_fill_style_str("#FFFFFF");
        ctx.fill_text("PAUSED", self.width / 2.0, self.height / 2.0)?;
        ctx.set_font(&format!("16px {FONT}"));
        ctx.fill_text(
            "Esc to resume    R for a new match",
            self.width / 2.0,
            self.height / 2.0 + 36.0,
        )?;
        Ok(())
    }
}

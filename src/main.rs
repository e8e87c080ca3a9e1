//! Host-side helper.
//!
//! `serve` builds the WASM bundle into `static/pkg`, serves `static/` over
//! HTTP and (if available) exposes it via ngrok. `simulate` runs the hero
//! choreography headless and prints the animation phases frame by frame.

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    host::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod host {
    use std::path::PathBuf;
    use std::process::{Command, ExitCode, Stdio};
    use std::{fs, thread, time::Duration};

    use clap::{Parser, Subcommand};
    use drifft_hero::director::{Capabilities, Environment, HeroDirector, PageEffects, PageLayout};
    use drifft_hero::geometry::{Rect, Rgb, Viewport};
    use drifft_hero::raster::{BoxRasterizer, GlyphBox};
    use drifft_hero::scheduler::FrameScheduler;
    use drifft_hero::scroll::Scroller;
    use drifft_hero::surface::Surface;
    use drifft_hero::{HeroConfig, HeroError, Result};

    #[derive(Parser)]
    #[command(name = "drifft-hero")]
    #[command(
        about = "Particle headline helper: serve the site or simulate the choreography",
        long_about = None
    )]
    #[command(version)]
    struct Cli {
        #[command(subcommand)]
        command: Commands,

        /// Verbosity level (can be repeated for more detail)
        #[arg(short, long, action = clap::ArgAction::Count, global = true)]
        verbose: u8,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Build the wasm bundle and serve static/
        Serve {
            #[arg(long, default_value_t = 8000)]
            port: u16,

            /// Skip `cargo build` / `wasm-pack` and serve what is there
            #[arg(long)]
            no_build: bool,

            /// Also open an ngrok tunnel to the server
            #[arg(long)]
            ngrok: bool,
        },

        /// Run the choreography without a browser
        Simulate {
            #[arg(long, default_value_t = 1440.0)]
            width: f32,

            #[arg(long, default_value_t = 900.0)]
            height: f32,

            #[arg(long, default_value_t = 1.0)]
            dpr: f32,

            #[arg(long, default_value = "DRIFFFT")]
            text: String,

            /// Seconds to simulate
            #[arg(long, default_value_t = 5.0)]
            seconds: f64,

            #[arg(long, default_value_t = 60.0)]
            fps: f64,

            /// Seconds between printed rows
            #[arg(long, default_value_t = 0.25)]
            every: f64,

            #[arg(long)]
            reduced_motion: bool,

            #[arg(long)]
            coarse_pointer: bool,

            /// Pretend the animation layer is unavailable
            #[arg(long = "static")]
            static_only: bool,

            /// Send one wheel tick at this time (seconds)
            #[arg(long)]
            wheel_at: Option<f64>,

            /// JSON config overriding the defaults
            #[arg(long)]
            config: Option<PathBuf>,

            #[arg(long, default_value_t = 7)]
            seed: u64,
        },
    }

    pub fn run() -> ExitCode {
        let cli = Cli::parse();
        let level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

        let result = match cli.command {
            Commands::Serve { port, no_build, ngrok } => serve(port, no_build, ngrok),
            Commands::Simulate {
                width,
                height,
                dpr,
                text,
                seconds,
                fps,
                every,
                reduced_motion,
                coarse_pointer,
                static_only,
                wheel_at,
                config,
                seed,
            } => {
                let env = Environment {
                    viewport: Viewport::new(width, height, dpr),
                    reduced_motion,
                    coarse_pointer,
                    capabilities: Capabilities {
                        canvas_2d: true,
                        timeline: !static_only,
                    },
                };
                let run = SimRun {
                    text,
                    seconds,
                    fps,
                    every,
                    wheel_at,
                    seed,
                };
                load_config(config).and_then(|cfg| simulate(cfg, env, &run))
            }
        };

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                log::error!("{err}");
                ExitCode::FAILURE
            }
        }
    }

    fn load_config(path: Option<PathBuf>) -> Result<HeroConfig> {
        match path {
            Some(path) => HeroConfig::from_json(&fs::read_to_string(path)?),
            None => Ok(HeroConfig::default()),
        }
    }

    // ---- serve --------------------------------------------------------------

    fn serve(port: u16, no_build: bool, ngrok: bool) -> Result<()> {
        if !no_build {
            log::info!("running cargo build");
            if !Command::new("cargo").args(["build", "--release"]).status()?.success() {
                return Err(HeroError::Tool("cargo build".into()));
            }

            log::info!("building wasm pkg");
            match Command::new("wasm-pack")
                .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
                .status()
            {
                Ok(st) if st.success() => {}
                Ok(_) => return Err(HeroError::Tool("wasm-pack build".into())),
                Err(_) => {
                    log::warn!("wasm-pack not found in PATH; serving possibly stale artifacts")
                }
            }
        }

        log::info!("serving static/ at http://127.0.0.1:{port}");
        let mut server = Command::new("python3")
            .args(["-m", "http.server", &port.to_string(), "--directory", "static"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if ngrok {
            match Command::new("ngrok")
                .args(["http", &port.to_string()])
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .spawn()
            {
                Ok(_) => log::info!("ngrok tunnel starting"),
                Err(_) => log::warn!("ngrok not found; install it to expose the site"),
            }
        }

        loop {
            if let Some(status) = server.try_wait()? {
                return Err(HeroError::Tool(format!("http server ({status})")));
            }
            thread::sleep(Duration::from_secs(1));
        }
    }

    // ---- simulate -----------------------------------------------------------

    struct SimRun {
        text: String,
        seconds: f64,
        fps: f64,
        every: f64,
        wheel_at: Option<f64>,
        seed: u64,
    }

    struct SimPage {
        y: f64,
        max: f64,
    }

    impl Scroller for SimPage {
        fn scroll_y(&self) -> f64 {
            self.y
        }

        fn max_scroll_y(&self) -> f64 {
            self.max
        }

        fn set_scroll_y(&mut self, y: f64) {
            self.y = y.clamp(0.0, self.max);
        }
    }

    #[derive(Default)]
    struct SimEffects {
        letters: f32,
    }

    impl PageEffects for SimEffects {
        fn set_letters(&mut self, progress: f32) {
            self.letters = progress;
        }

        fn reveal_footer(&mut self) {
            log::info!("footer revealed");
        }

        fn hide_footer(&mut self) {
            log::info!("footer hidden");
        }
    }

    /// Counts draw calls instead of drawing.
    struct CountingSurface {
        size: (u32, u32),
        circles: usize,
    }

    impl Surface for CountingSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn clear(&mut self) {
            self.circles = 0;
        }

        fn fill_circle(&mut self, _x: f32, _y: f32, _radius: f32, _color: Rgb, _alpha: f32) {
            self.circles += 1;
        }
    }

    struct Sim {
        director: HeroDirector,
        page: SimPage,
        effects: SimEffects,
        surface: CountingSurface,
    }

    /// Lay the text out as one centred line of equal-width glyph boxes.
    fn headline(text: &str, vp: Viewport) -> Vec<GlyphBox> {
        let n = text.chars().count().max(1) as f32;
        let height = (vp.height * 0.22).min(vp.width * 0.8 / n / 0.62);
        let width = height * 0.62;
        let x0 = (vp.width - width * n) * 0.5;
        let y = (vp.height - height) * 0.5;
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                GlyphBox::new(ch, Rect::new(x0 + i as f32 * width, y, width * 0.86, height))
            })
            .collect()
    }

    fn simulate(cfg: HeroConfig, env: Environment, run: &SimRun) -> Result<()> {
        let vp = env.viewport;
        let h = f64::from(vp.height);
        let mut director = HeroDirector::new(cfg, env, run.seed);
        director.set_layout(PageLayout {
            hero_top: 0.0,
            hero_height: h,
            content_top: h,
            footer_top: 3.0 * h,
        });
        let stats = director.rebuild(env, &mut BoxRasterizer::default(), &headline(&run.text, vp))?;
        println!(
            "{} particles ({} seeds, stride {}px, cap {}, {:?}), {} anchors, {:?}",
            stats.kept,
            stats.raw,
            stats.stride,
            stats.cap,
            stats.tier,
            director.field().bindings().len(),
            director.presentation()
        );

        let size = ((vp.width * vp.dpr) as u32, (vp.height * vp.dpr) as u32);
        let mut sim = Sim {
            director,
            page: SimPage { y: 0.0, max: 2.6 * h },
            effects: SimEffects::default(),
            surface: CountingSurface { size, circles: 0 },
        };

        let mut scheduler = FrameScheduler::new();
        scheduler.register("choreography", |sim: &mut Sim, time| {
            sim.director.frame_choreography(time.now, &mut sim.page, &mut sim.effects);
        });
        scheduler.register("field", |sim: &mut Sim, time| {
            sim.director.frame_field(time.dt, &mut sim.surface);
        });
        scheduler.start();

        println!(
            "{:>6} {:>6} {:>6} {:>6} {:>7} {:>8} {:>6}  {:<14} {}",
            "t", "letter", "intro", "ripple", "scatter", "scroll", "drawn", "mode", "stage"
        );
        let frames = (run.seconds * run.fps).ceil() as u64;
        let mut wheel_sent = false;
        let mut next_row = 0.0;
        for frame in 0..=frames {
            let t = frame as f64 / run.fps;
            if let Some(at) = run.wheel_at {
                if !wheel_sent && t >= at {
                    let outcome = sim.director.on_wheel(100.0, &sim.page);
                    log::info!("wheel at {t:.2}s -> {outcome:?}");
                    wheel_sent = true;
                }
            }
            scheduler.run_frame(&mut sim, t * 1000.0);
            sim.director.on_scroll(&mut sim.page);

            if t + 1e-9 >= next_row {
                next_row += run.every;
                let state = sim.director.field().state();
                println!(
                    "{:>6.2} {:>6.2} {:>6.3} {:>6.3} {:>7.3} {:>8.1} {:>6}  {:<14} {}",
                    t,
                    sim.effects.letters,
                    state.intro,
                    state.ripple,
                    state.scatter,
                    sim.page.y,
                    sim.surface.circles,
                    format!("{:?}", sim.director.scroll().mode())
                        .split_whitespace()
                        .next()
                        .unwrap_or(""),
                    sim.director.content_stage().unwrap_or("-"),
                );
            }
        }
        Ok(())
    }
}

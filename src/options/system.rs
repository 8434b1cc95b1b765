//! The system launch options shown on every game's configuration form.

use std::sync::Arc;

use crate::{
    config::Settings,
    error::SetupError,
    installer::paths::expand_user,
    probe::{display, gpu, terminal, Host},
};

use super::{
    Choice, ChoiceSource, Condition, OptionDescriptor as Opt, OptionList, OptionType as T,
    OptionValue as V, Scope,
};

fn off() -> V {
    V::text("off")
}

/// Builds the system option table for `host`.
///
/// Conditions and defaults are probed once here; choice lists are probed
/// again every time a form asks for them.
pub fn system_options(host: Arc<Host>, settings: &Settings) -> Result<OptionList, SetupError> {
    let has_gamescope = host.has_executable("gamescope");
    let has_pulse = host.has_executable("pulseaudio");
    let has_pipewire_pulse = host.has_executable("pipewire-pulse");
    let gamemode = host.gamemode_available();
    let dri_prime = host.use_dri_prime();
    let inhibitor = host.screen_saver_inhibitor();
    let x11 = !host.is_wayland();
    let vk_default = gpu::vk_icd_choices(&host)
        .into_iter()
        .next()
        .map(|c| c.value)
        .unwrap_or_default();

    let probed = |f: fn(&Host) -> Vec<Choice>| {
        let host = Arc::clone(&host);
        ChoiceSource::dynamic(move || f(&host))
    };

    let mut terminal_app = Opt::new("terminal_app", T::ChoiceWithEntry, "Text based games emulator")
        .choices(probed(terminal::terminal_choices))
        .advanced()
        .help(
            "The terminal emulator used with the CLI mode. Choose from the list of detected \
             terminal apps or enter the terminal's command or path.",
        );
    if let Some(t) = terminal::default_terminal(&host) {
        terminal_app = terminal_app.default_value(V::Text(t));
    }

    OptionList::new(vec![
        Opt::new("game_path", T::Directory, "Default installation folder")
            .default_value(V::Text(expand_user(&settings.game_path).display().to_string()))
            .scope(vec![Scope::Runner, Scope::System])
            .help("The default folder where you install your games."),
        Opt::new("disable_runtime", T::Bool, "Disable Lutris Runtime")
            .default_value(V::Bool(false))
            .help(
                "The Lutris Runtime loads some libraries before running the game, which can \
                 cause some incompatibilities in some cases. Check this option to disable it.",
            ),
        Opt::new("prefer_system_libs", T::Bool, "Prefer system libraries")
            .default_value(V::Bool(true))
            .help(
                "When the runtime is enabled, prioritize the system libraries over the \
                 provided ones.",
            ),
        Opt::new("reset_desktop", T::Bool, "Restore resolution on game exit")
            .default_value(V::Bool(false))
            .help(
                "Some games don't restore your screen resolution when closed or when they \
                 crash. This is when this option comes into play to save your bacon.",
            ),
        Opt::new("gamescope", T::Bool, "Enable gamescope")
            .default_value(V::Bool(false))
            .advanced()
            .condition(Condition::Static(has_gamescope && host.nvidia_gamescope_support()))
            .help(
                "Use gamescope to draw the game window isolated from your desktop.\n\
                 Use Ctrl+Super+F to toggle fullscreen",
            ),
        Opt::new("gamescope_output_res", T::String, "Gamescope output resolution")
            .advanced()
            .condition(Condition::Static(has_gamescope))
            .help("Resolution of the window on your desktop"),
        Opt::new("gamescope_game_res", T::String, "Gamescope game resolution")
            .advanced()
            .condition(Condition::Static(has_gamescope))
            .help("Resolution of the screen visible to the game"),
        Opt::new("single_cpu", T::Bool, "Restrict number of cores used")
            .default_value(V::Bool(false))
            .advanced()
            .help("Restrict the game to a maximum number of CPU cores."),
        Opt::new("limit_cpu_count", T::String, "Restrict number of cores to")
            .default_value(V::text("1"))
            .advanced()
            .help(
                "Maximum number of CPU cores to be used, if 'Restrict number of cores used' \
                 is turned on.",
            ),
        Opt::new("restore_gamma", T::Bool, "Restore gamma on game exit")
            .default_value(V::Bool(false))
            .advanced()
            .help(
                "Some games don't correctly restores gamma on exit, making your display too \
                 bright. Select this option to correct it.",
            ),
        Opt::new("disable_compositor", T::Bool, "Disable desktop effects")
            .default_value(V::Bool(false))
            .advanced()
            .help(
                "Disable desktop effects while game is running, reducing stuttering and \
                 increasing performance",
            ),
        Opt::new("disable_screen_saver", T::Bool, "Disable screen saver")
            .default_value(V::Bool(inhibitor))
            .condition(Condition::Static(inhibitor))
            .help(
                "Disable the screen saver while a game is running. Requires the screen \
                 saver's functionality to be exposed over DBus.",
            ),
        Opt::new("reset_pulse", T::Bool, "Reset PulseAudio")
            .default_value(V::Bool(false))
            .advanced()
            .condition(Condition::Static(has_pulse))
            .help("Restart PulseAudio before launching the game."),
        Opt::new("pulse_latency", T::Bool, "Reduce PulseAudio latency")
            .default_value(V::Bool(false))
            .advanced()
            .condition(Condition::Static(has_pulse || has_pipewire_pulse))
            .help(
                "Set the environment variable PULSE_LATENCY_MSEC=60 to improve audio quality \
                 on some games",
            ),
        Opt::new("use_us_layout", T::Bool, "Switch to US keyboard layout")
            .default_value(V::Bool(false))
            .advanced()
            .help("Switch to US keyboard QWERTY layout while game is running"),
        Opt::new("optimus", T::Choice, "Optimus launcher (NVIDIA Optimus laptops)")
            .default_value(off())
            .choices(probed(gpu::optimus_choices))
            .advanced()
            .help(
                "If you have installed the primus or bumblebee packages, select what launcher \
                 will run the game with the command, activating your NVIDIA graphic chip for \
                 high 3D performance. primusrun normally has better performance, but \
                 optirun/virtualgl works better for more games. Primus VK provide vulkan \
                 support under bumblebee.",
            ),
        Opt::new("vk_icd", T::Choice, "Vulkan ICD loader")
            .default_value(V::Text(vk_default))
            .choices(probed(gpu::vk_icd_choices))
            .advanced()
            .help(
                "The ICD loader is a library that is placed between a Vulkan application and \
                 any number of Vulkan drivers, in order to support multiple drivers and the \
                 instance-level functionality that works across these drivers.",
            ),
        Opt::new("mangohud", T::Bool, "FPS counter (MangoHud)")
            .default_value(V::Bool(false))
            .condition(Condition::Static(host.has_executable("mangohud")))
            .help(
                "Display the game's FPS + other information. Requires MangoHud to be installed.",
            ),
        Opt::new("fps_limit", T::String, "FPS limit")
            .advanced()
            .condition(Condition::Static(host.has_executable("strangle")))
            .help("Limit the game's FPS to desired number"),
        Opt::new("gamemode", T::Bool, "Enable Feral GameMode")
            .default_value(V::Bool(gamemode))
            .condition(Condition::Static(gamemode))
            .help("Request a set of optimisations be temporarily applied to the host OS"),
        Opt::new("prime", T::Bool, "Enable NVIDIA Prime Render Offload")
            .default_value(V::Bool(false))
            .condition(Condition::Static(true))
            .help(
                "If you have the latest NVIDIA driver and the properly patched xorg-server, you \
                 can launch a game on your NVIDIA GPU by toggling this switch. This will apply \
                 __NV_PRIME_RENDER_OFFLOAD=1 and __GLX_VENDOR_LIBRARY_NAME=nvidia environment \
                 variables.",
            ),
        Opt::new("dri_prime", T::Bool, "Use discrete graphics")
            .default_value(V::Bool(dri_prime))
            .advanced()
            .condition(Condition::Static(dri_prime))
            .help(
                "If you have open source graphic drivers (Mesa), selecting this option will \
                 run the game with the 'DRI_PRIME=1' environment variable, activating your \
                 discrete graphic chip for high 3D performance.",
            ),
        Opt::new("sdl_video_fullscreen", T::Choice, "SDL 1.2 Fullscreen Monitor")
            .default_value(off())
            .choices(probed(display::output_list))
            .advanced()
            .help(
                "Hint SDL 1.2 games to use a specific monitor when going fullscreen by setting \
                 the SDL_VIDEO_FULLSCREEN environment variable",
            ),
        Opt::new("display", T::Choice, "Turn off monitors except")
            .default_value(off())
            .choices(probed(display::output_choices))
            .advanced()
            .condition(Condition::Static(x11))
            .help(
                "Only keep the selected screen active while the game is running.\nThis is \
                 useful if you have a dual-screen setup, and are having display issues when \
                 running a game in fullscreen.",
            ),
        Opt::new("resolution", T::Choice, "Switch resolution to")
            .default_value(off())
            .choices(probed(display::resolution_choices))
            .condition(Condition::Static(x11))
            .help("Switch to this screen resolution while the game is running."),
        Opt::new("terminal", T::Bool, "CLI mode")
            .default_value(V::Bool(false))
            .advanced()
            .help(
                "Enable a terminal for text-based games. Only useful for ASCII based games. \
                 May cause issues with graphical games.",
            ),
        terminal_app,
        Opt::new("env", T::Mapping, "Environment variables")
            .help("Environment variables loaded at run time"),
        Opt::new("antimicro_config", T::File, "AntiMicroX Profile")
            .advanced()
            .help("Path to an AntiMicroX profile file"),
        Opt::new("prefix_command", T::String, "Command prefix")
            .advanced()
            .help("Command line instructions to add in front of the game's execution command."),
        Opt::new("manual_command", T::File, "Manual script")
            .advanced()
            .help("Script to execute from the game's contextual menu"),
        Opt::new("prelaunch_command", T::File, "Pre-launch script")
            .advanced()
            .help("Script to execute before the game starts"),
        Opt::new("prelaunch_wait", T::Bool, "Wait for pre-launch script completion")
            .default_value(V::Bool(false))
            .advanced()
            .help("Run the game only once the pre-launch script has exited"),
        Opt::new("postexit_command", T::File, "Post-exit script")
            .advanced()
            .help("Script to execute when the game exits"),
        Opt::new("include_processes", T::String, "Include processes")
            .advanced()
            .help(
                "What processes to include in process monitoring. This is to override the \
                 built-in exclude list.\nSpace-separated list, processes including spaces can \
                 be wrapped in quotation marks.",
            ),
        Opt::new("exclude_processes", T::String, "Exclude processes")
            .advanced()
            .help(
                "What processes to exclude in process monitoring. For example background \
                 processes that stick around after the game has been closed.\nSpace-separated \
                 list, processes including spaces can be wrapped in quotation marks.",
            ),
        Opt::new("killswitch", T::String, "Killswitch file")
            .advanced()
            .help(
                "Path to a file which will stop the game when deleted\n(usually /dev/input/js0 \
                 to stop the game on joystick unplugging)",
            ),
        Opt::new("sdl_gamecontrollerconfig", T::String, "SDL2 gamepad mapping")
            .advanced()
            .help(
                "SDL_GAMECONTROLLERCONFIG mapping string or path to a custom \
                 gamecontrollerdb.txt file containing mappings.",
            ),
        Opt::new("xephyr", T::Choice, "Use Xephyr")
            .default_value(off())
            .choices(ChoiceSource::Static(vec![
                Choice::new("Off", "off"),
                Choice::new("8BPP (256 colors)", "8bpp"),
                Choice::new("16BPP (65536 colors)", "16bpp"),
                Choice::new("24BPP (16M colors)", "24bpp"),
            ]))
            .advanced()
            .help("Run program in Xephyr to support 8BPP and 16BPP color modes"),
        Opt::new("xephyr_resolution", T::String, "Xephyr resolution")
            .advanced()
            .help("Screen resolution of the Xephyr server"),
        Opt::new("xephyr_fullscreen", T::Bool, "Xephyr Fullscreen")
            .default_value(V::Bool(true))
            .advanced()
            .help("Open Xephyr in fullscreen (at the desktop resolution)"),
    ])
}

#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::Delay;

use {defmt_rtt as _, panic_probe as _};

use engine::Tester;
use firmware::hardware::{self, capture::AccessTimer, port::BoardPort};
use firmware::split_resources;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("4164/41256 tester starting");
    let p = hardware::init();
    let r = split_resources!(p);

    let port = BoardPort::new(r.dram);
    let (leds, mode) = hardware::get_panel(r.panel);

    let mut tester = Tester::new(port, leds, Delay);

    info!("waiting out the bias generator, then waking the part");
    tester.power_up();

    // The strap is read once at boot; nothing revisits it at runtime.
    // Neither branch returns: from here on the tester owns the core and
    // never awaits.
    if mode.is_low() {
        info!("mode strap low: access-time measurement");
        let cap = AccessTimer::new(r.capture.tim, r.capture.dout);
        tester.run_measurement(cap)
    } else {
        info!("mode strap high: march test");
        tester.run_march()
    }
}

use core::convert::Infallible;

use bt_hci::controller::ExternalController;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant, Ticker};
use esp_hal::peripherals::BT;
use esp_hal::rng::Rng;
use esp_wifi::{ble::controller::BleConnector, EspWifiController};
use trouble_host::prelude::*;

use super::config::{Config, Resources, TELEMETRY_SERVICE_UUID};
use super::connection::ConnectionHandle;
use super::error::Error;
use super::gate::ccc_value;
use super::peripheral::PeripheralService;
use super::ports::{AdvertisingPort, AdvertisingRequest, NotifyPort};
use super::service::TelemetryService;
use crate::telemetry::{Frame, RandomSource, SampleSource};

#[gatt_server]
pub struct Server {
    telemetry_service: TelemetryService,
}

/// BLE stack, GATT server and the telemetry peripheral they serve
pub struct Ble<'a, C: Controller> {
    peripheral: Peripheral<'a, C>,
    server: Server<'a>,
    service: PeripheralService,
    rng: Rng,
}

impl<'a, C: Controller> Ble<'a, C> {
    fn new(peripheral: Peripheral<'a, C>, config: Config, rng: Rng) -> Result<Self, Error> {
        let server = Server::new_with_config(GapConfig::Peripheral(PeripheralConfig {
            name: config.name,
            appearance: &appearance::sensor::GENERIC_SENSOR,
        }))
        .map_err(|_| Error::StackInit)?;

        Ok(Self {
            peripheral,
            server,
            service: PeripheralService::new(config),
            rng,
        })
    }

    /// Run the host stack and the peripheral until the stack fails
    async fn start(stack: &'a Stack<'a, C>, config: Config, rng: Rng) -> Result<(), Error> {
        let Host {
            peripheral, runner, ..
        } = stack.build();

        let mut ble = Self::new(peripheral, config, rng)?;

        match select(ble_task(runner), ble.run_connection_loop()).await {
            Either::First(e) => Err(e),
            Either::Second(never) => match never {},
        }
    }

    /// Advertise, serve one central, repeat. Ticks keep running throughout.
    async fn run_connection_loop(&mut self) -> Infallible {
        let period = Duration::from_millis(self.service.config().tick_period_ms);
        let mut ticker = Ticker::every(period);
        let mut rng = self.rng;
        let mut source = RandomSource::new(move || rng.random());

        loop {
            let advertised = {
                let mut port = Advertiser {
                    peripheral: &mut self.peripheral,
                };
                select(
                    self.service.advertise(&mut port),
                    tick_loop(&self.service, &mut ticker, &mut source, &mut Unlinked),
                )
                .await
            };

            let conn = match advertised {
                Either::First(Ok(conn)) => conn,
                Either::First(Err(_)) => {
                    // Undiscoverable until an external restart; keep sampling
                    let never =
                        tick_loop(&self.service, &mut ticker, &mut source, &mut Unlinked).await;
                    match never {}
                }
                Either::Second(never) => match never {},
            };

            let handle = ConnectionHandle(conn.handle().raw());
            if self.service.on_connected(handle, 0).is_err() {
                continue;
            }

            let mut link = GattLink {
                server: &self.server,
                conn: &conn,
            };

            // Run until the central goes away, then return to advertising
            let reason = match select(
                gatt_events_task(&self.server, &self.service, &conn),
                tick_loop(&self.service, &mut ticker, &mut source, &mut link),
            )
            .await
            {
                Either::First(reason) => reason,
                Either::Second(never) => match never {},
            };

            self.service.on_disconnected(handle, reason);
        }
    }
}

/// Sample and notify once per tick, forever
async fn tick_loop<S: SampleSource, N: NotifyPort>(
    service: &PeripheralService,
    ticker: &mut Ticker,
    source: &mut S,
    port: &mut N,
) -> Infallible {
    loop {
        service.tick(Instant::now().as_millis(), source, port).await;
        ticker.next().await;
    }
}

/// Advertises through the trouble-host peripheral role
struct Advertiser<'p, 'a, C: Controller> {
    peripheral: &'p mut Peripheral<'a, C>,
}

impl<'a, C: Controller> AdvertisingPort for Advertiser<'_, 'a, C> {
    type Link = Connection<'a>;
    type Error = BleHostError<C::Error>;

    async fn advertise(
        &mut self,
        request: &AdvertisingRequest<'_>,
    ) -> Result<Connection<'a>, Self::Error> {
        let mut advertiser_data = [0; 31];
        let adv_len = if request.include_name {
            AdStructure::encode_slice(
                &[
                    AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
                    AdStructure::CompleteLocalName(request.name.as_bytes()),
                ],
                &mut advertiser_data[..],
            )?
        } else {
            AdStructure::encode_slice(
                &[AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED)],
                &mut advertiser_data[..],
            )?
        };

        let mut scan_data = [0; 31];
        let scan_len = AdStructure::encode_slice(
            &[AdStructure::ServiceUuids128(&[TELEMETRY_SERVICE_UUID.into()])],
            &mut scan_data[..],
        )?;

        let advertisement = if request.connectable {
            Advertisement::ConnectableScannableUndirected {
                adv_data: &advertiser_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            }
        } else {
            Advertisement::NonconnectableScannableUndirected {
                adv_data: &advertiser_data[..adv_len],
                scan_data: &scan_data[..scan_len],
            }
        };

        let advertiser = self
            .peripheral
            .advertise(&Default::default(), advertisement)
            .await
            .inspect_err(|e| {
                defmt::error!("[adv] error: {:?}", defmt::Debug2Format(e));
            })?;

        let conn = advertiser.accept().await?;
        defmt::info!("[adv] connection established");

        Ok(conn)
    }
}

/// Notifies over the telemetry characteristic of one connection
struct GattLink<'l, 'v, 'd> {
    server: &'l Server<'v>,
    conn: &'l Connection<'d>,
}

impl NotifyPort for GattLink<'_, '_, '_> {
    type Error = trouble_host::Error;

    async fn notify(
        &mut self,
        _connection: ConnectionHandle,
        payload: &Frame,
    ) -> Result<(), Self::Error> {
        let frame = self.server.telemetry_service.frame;

        frame
            .notify(self.server, self.conn, payload)
            .await
            .inspect_err(|e| {
                defmt::warn!("[gatt] notify error: {:?}", defmt::Debug2Format(e));
            })
    }
}

/// Port for the idle loop; the tracker is idle so it is never called
struct Unlinked;

impl NotifyPort for Unlinked {
    type Error = ();

    async fn notify(&mut self, _connection: ConnectionHandle, _payload: &Frame) -> Result<(), ()> {
        Err(())
    }
}

/// Handle GATT events until the connection closes; returns the HCI reason.
async fn gatt_events_task(
    server: &Server<'_>,
    service: &PeripheralService,
    conn: &Connection<'_>,
) -> u8 {
    let frame = server.telemetry_service.frame;

    loop {
        match conn.next().await {
            ConnectionEvent::Disconnected { reason } => return reason.into_inner(),
            ConnectionEvent::Gatt { data } => match data.process(server).await {
                Ok(Some(event)) => {
                    match &event {
                        GattEvent::Read(event) => {
                            if event.handle() == frame.handle {
                                // Stage one whole-record copy; the server clips
                                // it to the requested offset and MTU.
                                if server.set(&frame, &service.frame()).is_err() {
                                    defmt::warn!("[gatt] failed to stage telemetry frame");
                                }
                            }
                        }
                        GattEvent::Write(event) => {
                            if Some(event.handle()) == frame.cccd_handle {
                                match ccc_value(event.data()) {
                                    Some(value) => service.on_subscription_write(value),
                                    None => defmt::warn!("[gatt] short CCCD write"),
                                }
                            }
                        }
                    }

                    // This step is also performed at drop(), but writing it explicitly is necessary
                    // in order to ensure reply is sent.
                    match event.accept() {
                        Ok(reply) => reply.send().await,
                        Err(e) => {
                            defmt::warn!(
                                "[gatt] error sending response: {:?}",
                                defmt::Debug2Format(&e)
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    defmt::warn!(
                        "[gatt] error processing event: {:?}",
                        defmt::Debug2Format(&e)
                    );
                }
            },
        }
    }
}

/// Run the BLE host stack task; only returns when the stack fails
async fn ble_task<C: Controller>(mut runner: Runner<'_, C>) -> Error {
    loop {
        if let Err(e) = runner.run().await {
            defmt::error!("[ble_task] error: {:?}", defmt::Debug2Format(&e));
            return Error::StackInit;
        }

        embassy_futures::yield_now().await;
    }
}

/// Initialize and start the BLE module (entry point for the BLE module)
#[embassy_executor::task]
pub async fn start(bt: BT, init: &'static EspWifiController<'static>, rng: Rng) {
    defmt::info!("starting BLE");
    let connector = BleConnector::new(init, bt);

    let controller: ExternalController<_, 20> = ExternalController::new(connector);

    let mut resources = Resources::new();

    let config = Config::default();
    let stack =
        trouble_host::new(controller, &mut resources).set_random_address(config.host_address());

    if let Err(e) = Ble::start(&stack, config, rng).await {
        // Nothing left to advertise or notify with; idle until reset
        defmt::error!("Bluetooth stack failed: {:?}", e);
    }
}

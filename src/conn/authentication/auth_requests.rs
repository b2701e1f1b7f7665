use crate::{
    conn::{authentication::Authenticator, CommandOptions, ConnectionCore},
    impl_err,
    protocol::{
        parts::{AuthFields, ClientContext, ConnOptId, ConnectOptionsPart, DbConnectInfo},
        MessageType, Part, Reply, ReplyType, Request,
    },
    HdbError, HdbResult,
};

pub(crate) enum FirstAuthResponse {
    AuthenticatorAndChallenge(String, Vec<u8>),
    RedirectInfo(DbConnectInfo),
}

fn first_request<'a>(
    db_user: &'a str,
    o_application: Option<&str>,
    authenticators: &[Box<dyn Authenticator + Send + Sync>],
) -> Request<'a> {
    let mut request = Request::new(MessageType::Authenticate, CommandOptions::EMPTY);
    request.push(Part::ClientContext(ClientContext::new(o_application)));

    let mut auth_fields_out = AuthFields::with_capacity(1 + 2 * authenticators.len());
    auth_fields_out.push_string(db_user);
    for authenticator in authenticators {
        debug!("proposing {}", authenticator.name());
        auth_fields_out.push(authenticator.name_as_bytes());
        auth_fields_out.push(authenticator.initial_data());
    }
    request.push(Part::Auth(auth_fields_out));
    request
}

// The server replies selecting exactly one method, with that method's
// challenge; or - for HANA Cloud - with an error plus redirect information.
fn evaluate_first_response(reply: Reply) -> HdbResult<FirstAuthResponse> {
    reply.assert_expected_reply_type(ReplyType::Nil)?;
    let mut parts_iter = reply.parts.into_iter();
    let result = match (parts_iter.next(), parts_iter.next()) {
        (Some(Part::Auth(mut auth_fields)), p2) => {
            if let Some(part) = p2 {
                warn!("first_auth_request: ignoring unexpected part = {part:?}");
            }
            match (auth_fields.pop(), auth_fields.pop(), auth_fields.pop()) {
                (Some(server_challenge_data), Some(raw_name), None) => {
                    let authenticator_name = String::from_utf8_lossy(&raw_name).to_string();
                    Ok(FirstAuthResponse::AuthenticatorAndChallenge(
                        authenticator_name,
                        server_challenge_data,
                    ))
                }
                (_, _, _) => Err(impl_err!("expected 2 auth fields")),
            }
        }
        (Some(Part::Error(_server_errors)), Some(Part::DbConnectInfo(db_connect_info))) => {
            Ok(FirstAuthResponse::RedirectInfo(db_connect_info))
        }
        (Some(Part::Error(mut server_errors)), None) => {
            Err(HdbError::from(server_errors.remove(0)))
        }
        (p1, p2) => Err(impl_err!("unexpected db response with parts: {p1:?}, {p2:?}")),
    };

    for part in parts_iter {
        warn!("first_auth_request(): ignoring unexpected part = {part:?}");
    }

    result
}

pub(crate) fn first_auth_request(
    conn_core: &mut ConnectionCore,
    db_user: &str,
    authenticators: &[Box<dyn Authenticator + Send + Sync>],
) -> HdbResult<FirstAuthResponse> {
    let request = first_request(
        db_user,
        conn_core.connect_params().application(),
        authenticators,
    );

    // for MessageType::Authenticate, the default error handling in
    // roundtrip() is switched off
    let reply = conn_core.roundtrip(&request, None, None, None, &mut None)?;
    evaluate_first_response(reply)
}

fn second_request<'a>(
    db_user: &'a str,
    mut connect_options: ConnectOptionsPart,
    chosen_authenticator: &mut dyn Authenticator,
    server_challenge_data: &[u8],
    reconnect: bool,
) -> HdbResult<Request<'a>> {
    let mut request = Request::new(MessageType::Connect, CommandOptions::EMPTY);

    debug!("authenticating with {}", chosen_authenticator.name());

    let mut auth_fields = AuthFields::with_capacity(3);
    auth_fields.push_string(db_user);
    auth_fields.push(chosen_authenticator.name_as_bytes());
    auth_fields.push(chosen_authenticator.final_data(server_challenge_data)?);
    request.push(Part::Auth(auth_fields));

    if reconnect {
        if let Ok(connection_id) = connect_options.get(&ConnOptId::ConnectionID) {
            let connection_id = connection_id.clone();
            connect_options.insert(ConnOptId::OriginalAnchorConnectionID, connection_id);
        }
    }
    request.push(Part::ConnectOptions(connect_options));
    Ok(request)
}

fn evaluate_second_response(
    reply: Reply,
    chosen_authenticator: &mut (dyn Authenticator + Send + Sync),
    conn_core: &mut ConnectionCore,
) -> HdbResult<()> {
    reply.assert_expected_reply_type(ReplyType::Nil)?;

    conn_core.set_session_id(reply.session_id());

    for part in reply.parts {
        match part {
            Part::TopologyInformation(topology) => conn_core.set_topology(topology),
            Part::ConnectOptions(received_connect_options) => {
                conn_core
                    .connect_options_mut()
                    .digest_server_connect_options(received_connect_options)?;
            }
            Part::Auth(mut af) => match (af.pop(), af.pop(), af.pop()) {
                (Some(server_data), Some(method), None) => {
                    chosen_authenticator.evaluate_final_reply(&method, &server_data)?;
                }
                (_, _, _) => return Err(impl_err!("expected 2 auth fields")),
            },
            _ => warn!("second_auth_request: ignoring unexpected part = {part:?}"),
        }
    }
    Ok(())
}

pub(crate) fn second_auth_request(
    conn_core: &mut ConnectionCore,
    db_user: &str,
    chosen_authenticator: &mut (dyn Authenticator + Send + Sync),
    server_challenge_data: &[u8],
    reconnect: bool,
) -> HdbResult<()> {
    let request = second_request(
        db_user,
        conn_core.connect_options().for_server(),
        &mut *chosen_authenticator,
        server_challenge_data,
        reconnect,
    )?;

    let reply = conn_core
        .roundtrip(&request, None, None, None, &mut None)
        .map_err(|e| HdbError::Authentication {
            source: Box::new(e),
        })?;
    evaluate_second_response(reply, chosen_authenticator, conn_core)
}

//! HTML bodies for the portal emails.
//!
//! Rendering is pure so the content can be unit-tested without a transport.
//! User-facing copy is Spanish, matching the audience of the portal; the
//! validation link targets `<base_url>/validar/<token>`.

use arcop_core::{config::PortalConfig, request::Request};

fn footer(portal: &PortalConfig) -> String {
  let company = &portal.company;
  format!(
    r#"<div style="text-align:center;padding:24px;color:#666;font-size:13px;background:#f5f5f5;">
      <strong>{}</strong><br>
      RUT: {}<br>
      {} | {}<br><br>
      <small>Este es un correo autom&aacute;tico. Por favor no responda.</small>
    </div>"#,
    company.name, company.rut, company.dpo_email, company.dpo_phone
  )
}

fn wrap(body: String, portal: &PortalConfig) -> String {
  format!(
    r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family:Arial,sans-serif;margin:0;padding:0;">
  <div style="max-width:600px;margin:0 auto;background:white;">
    <div style="background:#1a73e8;color:white;padding:24px;text-align:center;">
      <h1 style="margin:0;font-size:24px;">Portal ARCOP</h1>
      <p style="margin:8px 0 0;font-size:13px;">Protecci&oacute;n de Datos Personales - Ley 21.719</p>
    </div>
    <div style="padding:24px;background:#f9f9f9;">
{body}
    </div>
{footer}
  </div>
</body>
</html>
"#,
    footer = footer(portal)
  )
}

/// The validation-link email sent right after a request is filed.
///
/// Includes the request number, RUT, email and preferred format, and warns
/// about the link's expiry window.
pub fn confirmation_html(request: &Request, portal: &PortalConfig) -> String {
  let link = format!(
    "{}/validar/{}",
    portal.base_url.trim_end_matches('/'),
    request.validation_token
  );
  let body = format!(
    r#"      <h2>Hola {name},</h2>
      <p>Hemos recibido su solicitud de acceso a datos personales conforme a la
      <strong>Ley 21.719 de Protecci&oacute;n de Datos Personales de Chile</strong>.</p>
      <p><strong>Para continuar, confirme su identidad:</strong></p>
      <div style="text-align:center;margin:24px 0;">
        <a href="{link}" style="display:inline-block;padding:14px 36px;background:#1a73e8;color:white;text-decoration:none;border-radius:6px;font-weight:bold;">
          Confirmar mi identidad
        </a>
      </div>
      <div style="background:#e8f0fe;border-left:4px solid #1a73e8;padding:16px;margin:20px 0;">
        <strong>Detalles de su solicitud:</strong><br><br>
        N&uacute;mero: <strong>{number}</strong><br>
        RUT: {rut}<br>
        Email: {email}<br>
        Formato: {format}
      </div>
      <div style="background:#fff3cd;border-left:4px solid #ffc107;padding:12px;margin:16px 0;">
        <strong>Importante:</strong> este enlace expira en <strong>{ttl} minutos</strong>.
      </div>
      <p style="color:#666;font-size:14px;">Si usted no realiz&oacute; esta solicitud, puede ignorar este correo.</p>
"#,
    name = request.full_name,
    number = request.number,
    rut = request.rut,
    email = request.email,
    format = request.preferred_format.as_str(),
    ttl = portal.deadlines.token_ttl_minutes,
  );
  wrap(body, portal)
}

/// Sent once the requester has clicked the validation link.
pub fn identity_confirmed_html(
  request: &Request,
  portal: &PortalConfig,
) -> String {
  let body = format!(
    r#"      <h2>Hola {name},</h2>
      <p>Su identidad fue confirmada correctamente.</p>
      <p>La solicitud <strong>{number}</strong> ser&aacute; respondida a m&aacute;s tardar el
      <strong>{deadline}</strong>. Le avisaremos por este medio cuando sus datos
      est&eacute;n disponibles.</p>
"#,
    name = request.full_name,
    number = request.number,
    deadline = request.response_deadline.format("%d-%m-%Y"),
  );
  wrap(body, portal)
}

/// Sent when the request is resolved and the export can be downloaded.
pub fn data_ready_html(
  request: &Request,
  download_url: &str,
  portal: &PortalConfig,
) -> String {
  let body = format!(
    r#"      <h2>Hola {name},</h2>
      <p>Sus datos personales est&aacute;n listos. La solicitud
      <strong>{number}</strong> fue resuelta.</p>
      <div style="text-align:center;margin:24px 0;">
        <a href="{url}" style="display:inline-block;padding:14px 36px;background:#188038;color:white;text-decoration:none;border-radius:6px;font-weight:bold;">
          Descargar mis datos ({format})
        </a>
      </div>
      <div style="background:#fff3cd;border-left:4px solid #ffc107;padding:12px;margin:16px 0;">
        <strong>Importante:</strong> el enlace de descarga expira en
        <strong>{ttl} horas</strong>.
      </div>
"#,
    name = request.full_name,
    number = request.number,
    url = download_url,
    format = request.preferred_format.as_str(),
    ttl = portal.deadlines.download_link_ttl_hours,
  );
  wrap(body, portal)
}
